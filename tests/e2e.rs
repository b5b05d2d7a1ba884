//! End-to-end integration tests for pauta-extract.
//!
//! These tests use real pauta exports in `./test_cases/` and need a pdfium
//! library. They are gated behind the `E2E_ENABLED` environment variable so
//! they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_inspect -- --nocapture

use futures::StreamExt;
use pauta_extract::{
    inspect, parse_file, parse_many, parse_to_file, NoopProgressCallback, ParseConfig,
    ParseOutput, ParseProgressCallback, PautaError,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/output");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Every PDF under `test_cases/`, sorted.
fn sample_pdfs() -> Vec<PathBuf> {
    let mut pdfs: Vec<PathBuf> = std::fs::read_dir(test_cases_dir())
        .map(|entries| {
            entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|e| e.eq_ignore_ascii_case("pdf")))
                .collect()
        })
        .unwrap_or_default();
    pdfs.sort();
    pdfs
}

/// Skip this test if E2E_ENABLED is not set *or* there are no sample PDFs.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let pdfs = sample_pdfs();
        if pdfs.is_empty() {
            println!("SKIP: no PDFs in {}", test_cases_dir().display());
            return;
        }
        pdfs
    }};
}

/// Structural checks every parsed pauta export must pass.
fn assert_output_consistent(output: &ParseOutput, context: &str) {
    assert!(
        !output.orders.is_empty(),
        "[{context}] no orders found in {} pages",
        output.stats.total_pages
    );
    assert_eq!(output.pages.len(), output.stats.total_pages, "[{context}] page results");

    for (code, order) in &output.orders {
        assert!(
            code.chars().all(|c| c.is_ascii_digit()),
            "[{context}] order code {code:?} is not numeric"
        );
        assert_eq!(
            order.field("Numero orden").map(ToString::to_string).as_deref(),
            Some(code.as_str()),
            "[{context}] order {code}: field and key disagree"
        );
        assert_eq!(order.task_count, order.tasks.len(), "[{context}] order {code}");
        for (i, task) in order.tasks.iter().enumerate() {
            assert_eq!(task.task_number, i + 1, "[{context}] order {code}");
            assert!(task.estimated_hours >= 0.0, "[{context}] order {code}");
        }
        let sum: f64 = order.tasks.iter().map(|t| t.estimated_hours).sum();
        assert!(
            (order.total_estimated_hours - sum).abs() < 0.001,
            "[{context}] order {code}: total {} vs sum {}",
            order.total_estimated_hours,
            sum
        );
        assert!(order.specialty_id <= 2, "[{context}] order {code}");
        assert!((1..=3).contains(&order.priority), "[{context}] order {code}");
        for section in &order.protocol_sections {
            assert_eq!(section.trim(), section, "[{context}] untrimmed section");
            assert!(!section.is_empty(), "[{context}] empty section");
        }
    }

    println!(
        "[{context}] ✓  {} orders, {} tasks, {}/{} pages",
        output.stats.order_count,
        output.stats.task_count,
        output.stats.text_pages,
        output.stats.total_pages
    );
}

// ── Inspect tests ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_inspect_samples() {
    let pdfs = e2e_skip_unless_ready!();
    let config = ParseConfig::default();

    for pdf in pdfs {
        let info = inspect(&pdf, &config).await.expect("inspect() should succeed");
        assert!(info.page_count > 0, "{} has no pages", pdf.display());
        assert!(!info.order_codes.is_empty(), "{} has no orders", pdf.display());
        println!("{}: {:?}", pdf.display(), info);
    }
}

#[tokio::test]
async fn test_inspect_nonexistent() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP");
        return;
    }

    let result = inspect("/definitely/not/a/real/file.pdf", &ParseConfig::default()).await;
    assert!(matches!(result, Err(PautaError::FileNotFound { .. })));
}

// ── Parse tests ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_parse_samples_are_consistent() {
    let pdfs = e2e_skip_unless_ready!();
    let config = ParseConfig::default();

    for pdf in pdfs {
        let context = pdf.file_name().unwrap().to_string_lossy().to_string();
        let output = parse_file(&pdf, &config).await.expect("parse should succeed");
        assert_output_consistent(&output, &context);
    }
}

#[tokio::test]
async fn test_parse_is_deterministic() {
    let pdfs = e2e_skip_unless_ready!();
    let config = ParseConfig::default();

    let first = parse_file(&pdfs[0], &config).await.expect("first parse");
    let second = parse_file(&pdfs[0], &config).await.expect("second parse");
    assert_eq!(first.orders, second.orders);
}

#[tokio::test]
async fn test_parse_to_file_writes_json() {
    let pdfs = e2e_skip_unless_ready!();
    let out_path = output_dir().join("orders.json");

    let stats = parse_to_file(&pdfs[0], &out_path, &ParseConfig::default(), false)
        .await
        .expect("parse_to_file should succeed");

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
    let orders = json.as_object().expect("top level is an object");
    assert_eq!(orders.len(), stats.order_count);
    for order in orders.values() {
        assert!(order.get("Tareas").is_some_and(|t| t.is_array()));
        assert!(order.get("Protocolos").is_some_and(|p| p.is_array()));
    }
}

#[tokio::test]
async fn test_summary_output() {
    let pdfs = e2e_skip_unless_ready!();
    let out_path = output_dir().join("summary.json");

    parse_to_file(&pdfs[0], &out_path, &ParseConfig::default(), true)
        .await
        .expect("summary should succeed");

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
    for summary in json.as_object().unwrap().values() {
        assert!(summary["code"].is_i64());
        assert_eq!(summary["obs_orden"], "");
    }
}

#[tokio::test]
async fn test_parse_many_covers_every_input() {
    let pdfs = e2e_skip_unless_ready!();
    let config = ParseConfig::builder().concurrency(2).build().unwrap();

    let results: Vec<_> = parse_many(pdfs.clone(), &config).collect().await;
    assert_eq!(results.len(), pdfs.len());
    for doc in results {
        assert!(doc.result.is_ok(), "{}: {:?}", doc.path.display(), doc.result.err());
    }
}

// ── Callback tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_callback_send_in_tokio_spawn() {
    let pdfs = e2e_skip_unless_ready!();

    #[derive(Default)]
    struct PageCounter(AtomicUsize);
    impl ParseProgressCallback for PageCounter {
        fn on_page_complete(&self, _page: usize, _total: usize, _lines: usize) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let counter = Arc::new(PageCounter::default());
    let config = ParseConfig::builder()
        .progress_callback(counter.clone())
        .build()
        .unwrap();
    let pdf = pdfs[0].clone();

    let output = tokio::spawn(async move { parse_file(&pdf, &config).await })
        .await
        .expect("task should not panic")
        .expect("parse should succeed");

    assert_eq!(
        counter.0.load(Ordering::SeqCst),
        output.stats.total_pages - output.stats.failed_pages
    );
}

#[test]
fn test_noop_callback_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<NoopProgressCallback>();
    assert_send_sync::<ParseConfig>();
}
