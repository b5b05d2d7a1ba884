//! CLI binary for pauta-extract.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ParseConfig` and writes the parsed orders as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use pauta_extract::parse::write_json_atomic;
use pauta_extract::{
    inspect, page_texts, parse_many, ParseConfig, ParseOutput, ParseProgressCallback,
    ProgressCallback,
};
use serde_json::Value;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar counting pages across every document of the
/// batch. Its length grows as each document reports its page count.
struct CliProgressCallback {
    bar: ProgressBar,
    page_errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Parsing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_errors: AtomicUsize::new(0),
        })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ParseProgressCallback for CliProgressCallback {
    fn on_document_start(&self, total_pages: usize) {
        self.bar.inc_length(total_pages as u64);
    }

    fn on_page_complete(&self, _page_num: usize, _total: usize, _line_count: usize) {
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.page_errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_order_complete(&self, order_code: &str, task_count: usize) {
        self.bar
            .set_message(format!("order {order_code} ({task_count} tasks)"));
    }

    fn on_document_complete(&self, total_pages: usize, order_count: usize) {
        self.bar.println(format!(
            "  {} {} orders  {}",
            green("✓"),
            bold(&order_count.to_string()),
            dim(&format!("{total_pages} pages")),
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Parse one export to stdout
  pauta2json pautas.pdf

  # Write the orders to a file
  pauta2json pautas.pdf -o ordenes.json

  # Typed work-order summaries only
  pauta2json --summary pautas.pdf -o resumen.json

  # Several exports into a directory (one JSON per input)
  pauta2json semana1.pdf semana2.pdf -o salida/

  # Pre-extracted words instead of a PDF
  pauta2json palabras.json

  # Show the reconstructed page text (to tune --y-tolerance / --task-offset)
  pauta2json --dump-text pautas.pdf

  # Pages and order codes only
  pauta2json --inspect-only pautas.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  PAUTA_*                 Every flag has a PAUTA_ variable (see --help)
  RUST_LOG                Override log filter (e.g. pauta_extract=debug)
"#;

/// Parse maintenance-schedule PDFs into structured work orders.
#[derive(Parser, Debug)]
#[command(
    name = "pauta2json",
    version,
    about = "Parse maintenance-schedule PDFs (pautas) into JSON work orders",
    long_about = "Rebuild reading order from PDF word positions and extract, per maintenance \
order, the header fields, the task table with estimated hours, and the safety protocols \
attached to each task.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files or JSON word dumps.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (one input) or directory (several inputs). Default: stdout.
    #[arg(short, long, env = "PAUTA_OUTPUT")]
    output: Option<PathBuf>,

    /// Write typed work-order summaries instead of full records.
    #[arg(long, env = "PAUTA_SUMMARY")]
    summary: bool,

    /// Print the reconstructed text of every page and exit.
    #[arg(long, conflicts_with = "inspect_only")]
    dump_text: bool,

    /// Print page count and order codes only, no field extraction.
    #[arg(long)]
    inspect_only: bool,

    /// Vertical tolerance for grouping words into one line.
    #[arg(long, env = "PAUTA_Y_TOLERANCE", default_value_t = 5.0)]
    y_tolerance: f64,

    /// Horizontal gap above which words are separated by a space.
    #[arg(long, env = "PAUTA_WORD_GAP", default_value_t = 1.0)]
    word_gap: f64,

    /// 0-based line where the task table starts inside an order.
    #[arg(long, env = "PAUTA_TASK_OFFSET", default_value_t = 17)]
    task_offset: usize,

    /// Header lines dropped from continuation pages.
    #[arg(long, env = "PAUTA_HEADER_LINES", default_value_t = 3)]
    header_lines: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PAUTA_PASSWORD")]
    password: Option<String>,

    /// Path to libpdfium (file or directory).
    #[arg(long, env = "PAUTA_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Documents parsed at the same time.
    #[arg(short, long, env = "PAUTA_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Disable progress bar.
    #[arg(long, env = "PAUTA_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAUTA_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PAUTA_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.dump_text && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress
            .clone()
            .map(|cb| cb as Arc<dyn ParseProgressCallback>),
    )?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        for input in &cli.inputs {
            let info = inspect(input, &config)
                .await
                .with_context(|| format!("Failed to inspect {}", input.display()))?;
            println!("File:         {}", input.display());
            println!("Pages:        {}", info.page_count);
            println!("Text pages:   {}", info.text_pages);
            println!("Failed pages: {}", info.failed_pages);
            println!("Orders:       {}", info.order_codes.join(", "));
        }
        return Ok(());
    }

    // ── Dump-text mode ───────────────────────────────────────────────────
    if cli.dump_text {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        for input in &cli.inputs {
            let pages = page_texts(input, &config)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            for (page_num, text) in pages {
                writeln!(handle, "===== {} · page {} =====", input.display(), page_num)
                    .context("Failed to write to stdout")?;
                for (i, line) in text.lines().enumerate() {
                    writeln!(handle, "{i:>3} | {line}").context("Failed to write to stdout")?;
                }
            }
        }
        return Ok(());
    }

    // ── Parse ────────────────────────────────────────────────────────────
    let many = cli.inputs.len() > 1;
    let mut failures = 0usize;
    let mut collected: Vec<(PathBuf, Value)> = Vec::new();
    let mut results = parse_many(cli.inputs.clone(), &config);

    while let Some(doc) = results.next().await {
        match doc.result {
            Ok(output) => {
                let value = render(&output, cli.summary)?;
                match cli.output {
                    Some(ref out) => {
                        let target = output_target(out, &doc.path, many);
                        write_json_atomic(&target, &value)
                            .await
                            .with_context(|| format!("Failed to write {}", target.display()))?;
                        if !cli.quiet {
                            report(&output, &doc.path, Some(&target), progress.as_deref());
                        }
                    }
                    None => {
                        if !cli.quiet {
                            report(&output, &doc.path, None, progress.as_deref());
                        }
                        collected.push((doc.path, value));
                    }
                }
            }
            Err(e) => {
                failures += 1;
                let line = format!("{} {}: {}", red("✘"), doc.path.display(), e);
                match progress {
                    Some(ref cb) => cb.bar.println(line),
                    None => eprintln!("{line}"),
                }
            }
        }
    }
    if let Some(ref cb) = progress {
        cb.finish();
    }

    // ── Stdout output ────────────────────────────────────────────────────
    if cli.output.is_none() && !collected.is_empty() {
        let value = if many {
            let mut map = serde_json::Map::new();
            for (path, v) in collected {
                map.insert(path.display().to_string(), v);
            }
            Value::Object(map)
        } else {
            collected.remove(0).1
        };
        let json = serde_json::to_string_pretty(&value).context("Failed to serialise output")?;
        println!("{json}");
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} documents failed", cli.inputs.len());
    }
    Ok(())
}

/// Map CLI args to `ParseConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ParseConfig> {
    let mut builder = ParseConfig::builder()
        .y_tolerance(cli.y_tolerance)
        .word_gap(cli.word_gap)
        .task_table_offset(cli.task_offset)
        .continuation_header_lines(cli.header_lines)
        .concurrency(cli.concurrency);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn render(output: &ParseOutput, summary: bool) -> Result<Value> {
    let value = if summary {
        serde_json::to_value(output.summaries())
    } else {
        serde_json::to_value(&output.orders)
    };
    value.context("Failed to serialise output")
}

/// Where one document's JSON goes: the file itself, or `<dir>/<stem>.json`
/// when several inputs share one output directory.
fn output_target(out: &Path, input: &Path, many: bool) -> PathBuf {
    if many || out.is_dir() {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        out.join(format!("{stem}.json"))
    } else {
        out.to_path_buf()
    }
}

fn report(
    output: &ParseOutput,
    input: &Path,
    target: Option<&Path>,
    progress: Option<&CliProgressCallback>,
) {
    let s = &output.stats;
    let mark = if s.failed_pages == 0 { green("✔") } else { cyan("⚠") };
    let dest = target
        .map(|t| format!("  →  {}", bold(&t.display().to_string())))
        .unwrap_or_default();
    let line = format!(
        "{}  {}  {} orders  {} tasks  {}/{} pages  {}ms{}",
        mark,
        input.display(),
        s.order_count,
        s.task_count,
        s.text_pages,
        s.total_pages,
        s.total_duration_ms,
        dest,
    );
    match progress {
        Some(cb) => cb.bar.println(line),
        None => eprintln!("{line}"),
    }
    if s.failed_pages > 0 {
        let failed = format!("   {} pages failed", red(&s.failed_pages.to_string()));
        match progress {
            Some(cb) => cb.bar.println(failed),
            None => eprintln!("{failed}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_output_is_used_verbatim() {
        let t = output_target(Path::new("/tmp/x/ordenes.json"), Path::new("a.pdf"), false);
        assert_eq!(t, PathBuf::from("/tmp/x/ordenes.json"));
    }

    #[test]
    fn batch_output_goes_into_directory() {
        let t = output_target(Path::new("/tmp/out"), Path::new("/data/semana1.pdf"), true);
        assert_eq!(t, PathBuf::from("/tmp/out/semana1.json"));
    }

    #[test]
    fn cli_flags_map_onto_config() {
        let cli = Cli::parse_from([
            "pauta2json",
            "--task-offset",
            "12",
            "--y-tolerance",
            "3.5",
            "-c",
            "2",
            "a.pdf",
        ]);
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.task_table_offset, 12);
        assert_eq!(config.y_tolerance, 3.5);
        assert_eq!(config.concurrency, 2);
    }
}
