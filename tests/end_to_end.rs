use std::sync::{Arc, Mutex};

use sheet_metrics::DeliveryError;
use sheet_metrics::config::{FieldConfig, FileConfig, TagConfig, TimestampConfig};
use sheet_metrics::execution::{
    ExecutionEngine, ExecutionOptions, ProcessingEvent, ProcessingObserver, Reporter,
    process_sheet,
};
use sheet_metrics::output::{Batch, Sink, Uploader};
use sheet_metrics::sheet::Sheet;
use sheet_metrics::types::{Cell, CellType, NullAction, TimeUnit};

#[derive(Default)]
struct RecordingSink {
    batches: Mutex<Vec<Batch>>,
}

impl Sink for RecordingSink {
    fn deliver(&self, batch: &Batch) -> Result<(), DeliveryError> {
        self.batches.lock().unwrap().push(batch.clone());
        Ok(())
    }
}

#[derive(Default)]
struct CollectingObserver {
    events: Mutex<Vec<String>>,
}

impl ProcessingObserver for CollectingObserver {
    fn on_event(&self, event: &ProcessingEvent<'_>) {
        let label = match event {
            ProcessingEvent::FileStarted { .. } => "file_started".to_string(),
            ProcessingEvent::SheetStarted { sheet, .. } => format!("sheet:{sheet}"),
            ProcessingEvent::RowEmitted { row, .. } => format!("emit:{row}"),
            ProcessingEvent::RowDropped { row, reason, .. } => format!("drop:{row}:{reason}"),
            ProcessingEvent::FileAborted { row, column, .. } => format!("abort:{row}:{column}"),
            ProcessingEvent::BatchDelivered { points, .. } => format!("batch:{points}"),
            ProcessingEvent::DeliveryFailed { .. } => "delivery_failed".to_string(),
            ProcessingEvent::FileFinished { .. } => "file_finished".to_string(),
            ProcessingEvent::FileFailed { .. } => "file_failed".to_string(),
        };
        self.events.lock().unwrap().push(label);
    }
}

fn s(v: &str) -> Cell {
    Cell::String(v.to_string())
}

fn weather_config() -> FileConfig {
    FileConfig {
        source: "weather.csv".to_string(),
        measurement: Some("weather".to_string()),
        tags: vec![TagConfig::new("city")],
        fields: Some(vec![FieldConfig::new("temp", CellType::Float)]),
        timestamp: Some(TimestampConfig {
            column: "ts".to_string(),
            unit: Some(TimeUnit::S),
            ..Default::default()
        }),
        primary_key: Some("id".to_string()),
        ..Default::default()
    }
}

#[test]
fn duplicate_key_keeps_only_first_row() {
    let sheet = Sheet::new(
        "weather",
        vec![
            vec![s("id"), s("city"), s("temp"), s("ts")],
            vec![Cell::Int(1), s("NY"), Cell::Float(21.5), Cell::Int(1_700_000_000)],
            vec![Cell::Int(1), s("NY"), Cell::Float(22.0), Cell::Int(1_700_000_100)],
        ],
    );
    let sink = RecordingSink::default();
    let reporter = Reporter::default();
    let mut uploader = Uploader::new(&sink, 100);

    let report = process_sheet(&sheet, &weather_config(), &mut uploader, &reporter).unwrap();
    assert_eq!(report.rows_emitted, 1);
    assert_eq!(report.duplicates, 1);
    uploader.flush_final();

    let batches = sink.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].body, "weather,city=NY temp=21.5 1700000000000000000\n");
}

#[test]
fn abort_halts_the_file_and_reports_events_in_order() {
    let path = std::env::temp_dir().join(format!("sheet_metrics_{}_abort.csv", std::process::id()));
    std::fs::write(
        &path,
        "id,city,temp,ts\n1,NY,21.5,1700000000\n2,LA,,1700000100\n3,SF,19.0,1700000200\n",
    )
    .unwrap();
    let mut cfg = weather_config();
    cfg.source = path.to_string_lossy().into_owned();
    cfg.fields = Some(vec![FieldConfig {
        null_action: NullAction::Abort,
        ..FieldConfig::new("temp", CellType::Float)
    }]);

    let sink = Arc::new(RecordingSink::default());
    let observer = Arc::new(CollectingObserver::default());
    let engine = ExecutionEngine::new(Arc::clone(&sink) as Arc<dyn Sink>, ExecutionOptions::default())
        .with_observer(Arc::clone(&observer) as Arc<dyn ProcessingObserver>);
    let metrics = engine.metrics();
    let report = engine.run(&[cfg]);
    let _ = std::fs::remove_file(&path);

    let file = report.files[0].result.as_ref().unwrap();
    let abort = file.aborted().unwrap();
    assert_eq!((abort.row, abort.column.as_str()), (3, "temp"));
    assert_eq!(file.rows_emitted(), 1);

    let batches = sink.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].body, "weather,city=NY temp=21.5 1700000000000000000\n");

    let stem = path.file_stem().unwrap().to_string_lossy().into_owned();
    let events = observer.events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            "file_started".to_string(),
            format!("sheet:{stem}"),
            "emit:2".to_string(),
            "abort:3:temp".to_string(),
            "batch:1".to_string(),
            "file_finished".to_string(),
        ]
    );

    let snap = metrics.snapshot();
    assert_eq!(snap.files_started, 1);
    assert_eq!(snap.files_finished, 1);
    assert_eq!(snap.files_aborted, 1);
    assert_eq!(snap.points_delivered, 1);
}
