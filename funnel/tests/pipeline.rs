use offer_funnel::{
    load_events, run, AnalysisOptions, CsvError, Dimension, EventKind, PipelineError, Query,
    SliceKey, SliceThresholds, StageOrder,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const EVENTS: &str = "\
customer_id,event,value,time
c1,offer received,\"{'offer id': 'bogo10'}\",0
c2,offer received,\"{'offer id': 'bogo10'}\",0
c3,offer received,\"{'offer id': 'bogo10'}\",0
c1,offer viewed,\"{'offer id': 'bogo10'}\",6
c1,offer viewed,\"{'offer id': 'bogo10'}\",8
c2,offer viewed,\"{'offer id': 'bogo10'}\",12
c1,offer completed,\"{'offer_id': 'bogo10', 'reward': 10}\",30
c4,offer received,\"{'offer id': 'disc2'}\",0
c4,offer viewed,\"{'offer id': 'ghost'}\",3
c1,transaction,{'amount': 12.5},30
c2,transaction,{'amount': 7.25},40
c3,offer viewed,{broken,50
";

const OFFERS: &str = "\
offer_id,offer_type,difficulty,reward,duration,channels
bogo10,bogo,10,10,7,web
disc2,discount,2,2,10,email
info,informational,,0,3,mobile
";

fn fixtures() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let events = dir.path().join("events.csv");
    let offers = dir.path().join("offers.csv");
    fs::write(&events, EVENTS).unwrap();
    fs::write(&offers, OFFERS).unwrap();
    (dir, events, offers)
}

#[test]
fn test_full_report() {
    let (_dir, events, offers) = fixtures();

    let output = run(&events, &offers, &AnalysisOptions::default()).unwrap();
    let report = &output.report;

    assert_eq!(report.cleaning.rows, 12);
    assert_eq!(report.cleaning.malformed, 1);
    assert_eq!(report.offers.loaded, 3);
    assert_eq!(report.transactions.transactions, 2);
    assert_eq!(report.transactions.total_amount, 19.75);

    // received 4, viewed 4 (c1, c2, c4, c3 with a broken payload), completed 1
    let overall = report.queries.iter().find(|q| q.name == "overall").unwrap();
    assert_eq!(overall.rows[0].event_count, 4);
    assert_eq!(overall.rows[0].previous_count, None);
    assert_eq!(overall.rows[2].event, EventKind::OfferCompleted);
    assert_eq!(overall.rows[2].churn_rate, Some(75.0));
}

#[test]
fn test_offer_type_slice_drops_unmatched() {
    let (_dir, events, offers) = fixtures();

    let output = run(&events, &offers, &AnalysisOptions::default()).unwrap();
    let by_type = output
        .report
        .queries
        .iter()
        .find(|q| q.dimension == Some(Dimension::OfferType))
        .unwrap();

    let bogo: Vec<_> = by_type
        .rows
        .iter()
        .filter(|r| r.slice == Some(SliceKey::Text("bogo".into())))
        .collect();
    assert_eq!(bogo.len(), 3);
    assert_eq!(bogo[0].event_count, 3);
    assert_eq!(bogo[1].event_count, 2);
    assert_eq!(bogo[1].churn_rate, Some(33.33));
    assert_eq!(bogo[2].churn_rate, Some(50.0));

    let join = by_type.join.as_ref().unwrap();
    // 'ghost' is unknown, the broken payload has no offer id
    assert_eq!(join.unmatched, 1);
    assert_eq!(join.without_offer_id, 1);
}

#[test]
fn test_difficulty_minimum_filter() {
    let (_dir, events, offers) = fixtures();

    let output = run(&events, &offers, &AnalysisOptions::default()).unwrap();
    let difficulty = output
        .report
        .queries
        .iter()
        .find(|q| q.name == "difficulty")
        .unwrap();
    assert!(difficulty
        .rows
        .iter()
        .all(|r| r.slice == Some(SliceKey::Number(10.0))));

    let options = AnalysisOptions {
        queries: vec![Query::Difficulty],
        thresholds: SliceThresholds::none(),
        order_override: Some(StageOrder::Canonical),
    };
    let output = run(&events, &offers, &options).unwrap();
    let rows = &output.report.queries[0].rows;
    assert_eq!(rows[0].slice, Some(SliceKey::Number(2.0)));
    assert_eq!(rows[0].event, EventKind::OfferReceived);
}

#[test]
fn test_cleaned_output_file() {
    let (dir, events, offers) = fixtures();
    let output = run(&events, &offers, &AnalysisOptions::default()).unwrap();

    let path = dir.path().join("events_cleaned.csv");
    output.cleaned.write_csv_file(&path).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    let mut lines = written.lines();
    assert_eq!(
        lines.next().unwrap(),
        "customer_id,event,value,time,transaction_amount,offer_id,reward_amount"
    );
    assert!(written.contains("offer completed,\"{'offer_id': 'bogo10', 'reward': 10}\",30,,bogo10,10"));
    assert!(written.contains("c1,transaction,{'amount': 12.5},30,12.5,,"));
}

#[test]
fn test_missing_events_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.csv");
    fs::write(&path, "customer_id,value\nc1,{}\n").unwrap();

    let err = load_events(&path).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Csv(CsvError::MissingColumn { column: "event", .. })
    ));
}

#[test]
fn test_header_only_events_rejected() {
    let (dir, _, offers) = fixtures();
    let path = dir.path().join("empty.csv");
    fs::write(&path, "customer_id,event,value,time\n").unwrap();

    assert!(matches!(load_events(&path), Err(PipelineError::EmptyInput)));
    assert!(matches!(
        run(&path, &offers, &AnalysisOptions::default()),
        Err(PipelineError::EmptyInput)
    ));
}
