//! CLI binary for docstamp.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `WatermarkConfig` / `CompressionConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docstamp::{
    default_output_name, download_when_ready, probe_progress, start_and_download,
    watermark_to_file, CompressionConfig, DownloadObserver, FileType, HttpCompressionClient,
    ImageEncoding, JobHandle, Language, NoopProgressCallback, PageSelection, ProgressProbe,
    StartRequest, WatermarkCallback, WatermarkConfig, WatermarkProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── Watermark progress ───────────────────────────────────────────────────────

/// Terminal progress for the watermark flow: one bar, one line per page.
struct CliWatermarkProgress {
    bar: ProgressBar,
    page_start: Mutex<Instant>,
    errors: AtomicUsize,
}

impl CliWatermarkProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_start: Mutex::new(Instant::now()),
            errors: AtomicUsize::new(0),
        })
    }

    /// Time since the previous page finished, restarting the clock.
    fn lap(&self) -> f64 {
        match self.page_start.lock() {
            Ok(mut start) => {
                let secs = start.elapsed().as_secs_f64();
                *start = Instant::now();
                secs
            }
            Err(_) => 0.0,
        }
    }
}

impl WatermarkProgressCallback for CliWatermarkProgress {
    fn on_document_start(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.red/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Stamping");
        self.bar.reset_eta();
        self.lap();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Watermarking {total_pages} pages…"))
        ));
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{:.1}s", self.lap())),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total_pages,
            red(&msg),
            dim(&format!("{:.1}s", self.lap())),
        ));
        self.bar.inc(1);
    }

    fn on_document_complete(&self, total_pages: usize, stamped: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!("{} {} pages stamped", green("✔"), bold(&stamped.to_string()));
        } else {
            eprintln!(
                "{} {}/{} pages stamped  ({} skipped)",
                cyan("⚠"),
                bold(&stamped.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

// ── Download notices ─────────────────────────────────────────────────────────

/// Prints the compression flow's notices and a percentage bar.
struct CliDownloadObserver {
    bar: ProgressBar,
}

impl CliDownloadObserver {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Compressing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }
}

impl DownloadObserver for CliDownloadObserver {
    fn on_job_started(&self, handle: &JobHandle) {
        self.bar
            .println(format!("{} Job {} started", cyan("◆"), bold(handle.as_str())));
    }

    fn on_progress(&self, progress: f64, is_completed: bool) {
        let pct = if is_completed { 100 } else { progress.round() as u64 };
        self.bar.set_position(pct.min(100));
    }

    fn on_probe_failed(&self, reason: &str) {
        self.bar
            .println(format!("  {} {}", dim("?"), dim(&format!("status unknown: {reason}"))));
    }

    fn on_not_ready(&self, handle: &JobHandle) {
        self.bar.println(format!(
            "  {} Job {} is still being prepared, checking again shortly…",
            cyan("…"),
            handle
        ));
    }

    fn on_retry(&self, attempt: u32, max_retries: u32) {
        self.bar.set_message(format!("check {attempt}/{max_retries}"));
    }

    fn on_timed_out(&self, attempts: u32) {
        self.bar.abandon();
        eprintln!(
            "{} File preparation timed out after {} checks. Please try again later.",
            red("✘"),
            attempts
        );
    }

    fn on_rejected(&self, message: &str) {
        self.bar.abandon();
        eprintln!("{} {}", red("✘"), red(message));
    }

    fn on_downloaded(&self, filename: &str, bytes: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Downloaded {}  {}",
            green("✔"),
            bold(filename),
            dim(&format!("{bytes} bytes"))
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Stamp a drawing (writes drawing_watermarked.pdf)
  docstamp watermark drawing.pdf

  # Chinese label with a user name, pages 1-3, JPEG output
  docstamp watermark drawing.pdf --lang zh --user 张工 --pages 1-3 --jpeg-quality 85

  # Stamp a PDF straight from a URL
  docstamp watermark https://parts.example.com/media/A-100.pdf -o A-100.pdf

  # Compress and download the PDFs of three products
  docstamp fetch --products 101,102,103 --file-type pdf -d downloads/

  # Download an already started job
  docstamp download 9f1c2e --file-type step

  # Check a job once
  docstamp progress 9f1c2e --json

ENVIRONMENT VARIABLES:
  DOCSTAMP_BASE_URL       Server origin (default http://127.0.0.1:8000)
  DOCSTAMP_CSRF_TOKEN     CSRF token sent with start/download requests
  DOCSTAMP_SESSION        Session cookie value
  DOCSTAMP_USER           Name printed on the watermark label
  DOCSTAMP_FONT           Font file for the watermark label
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, e.g. docstamp=debug
"#;

/// Stamp PDFs with a reference watermark and fetch compressed document bundles.
#[derive(Parser, Debug)]
#[command(
    name = "docstamp",
    version,
    about = "Stamp PDFs with a reference watermark and fetch compressed document bundles",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Disable progress bars.
    #[arg(long, global = true, env = "DOCSTAMP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCSTAMP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCSTAMP_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rasterise a PDF, tile the watermark over every page and write a new PDF.
    Watermark(WatermarkArgs),
    /// Start a compression job, wait for it and download the archive.
    Fetch(FetchArgs),
    /// Wait for an existing compression job and download the archive.
    Download(DownloadArgs),
    /// Check the progress of a compression job once.
    Progress(ProgressArgs),
}

#[derive(Args, Debug)]
struct WatermarkArgs {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Output file. Default: <input stem>_watermarked.pdf.
    #[arg(short, long, env = "DOCSTAMP_OUTPUT")]
    output: Option<PathBuf>,

    /// Label language. Default: detected from LC_ALL / LANG.
    #[arg(long, env = "DOCSTAMP_LANG", value_enum)]
    lang: Option<LangArg>,

    /// Name printed on the label's second line.
    #[arg(long, env = "DOCSTAMP_USER")]
    user: Option<String>,

    /// TrueType/OpenType font for the label.
    #[arg(long, env = "DOCSTAMP_FONT")]
    font: Option<PathBuf>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "DOCSTAMP_PAGES", default_value = "all")]
    pages: String,

    /// Embed pages as JPEG at this quality (1–100) instead of lossless.
    #[arg(long, env = "DOCSTAMP_JPEG_QUALITY",
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: Option<u8>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "DOCSTAMP_PASSWORD")]
    password: Option<String>,

    /// Leave out pages that fail to render instead of aborting.
    #[arg(long, env = "DOCSTAMP_SKIP_FAILED_PAGES")]
    skip_failed_pages: bool,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, env = "DOCSTAMP_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print the run statistics as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone)]
struct ServerArgs {
    /// Server origin.
    #[arg(long, env = "DOCSTAMP_BASE_URL", default_value = "http://127.0.0.1:8000")]
    base_url: String,

    /// CSRF token for start and download requests.
    #[arg(long, env = "DOCSTAMP_CSRF_TOKEN", hide_env_values = true)]
    csrf_token: Option<String>,

    /// Session cookie value.
    #[arg(long, env = "DOCSTAMP_SESSION", hide_env_values = true)]
    session: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "DOCSTAMP_REQUEST_TIMEOUT", default_value_t = 30)]
    request_timeout: u64,

    /// Delay between status re-checks in milliseconds.
    #[arg(long, env = "DOCSTAMP_INTERVAL_MS", default_value_t = 2000)]
    interval_ms: u64,

    /// Maximum number of status re-checks.
    #[arg(long, env = "DOCSTAMP_MAX_RETRIES", default_value_t = 10)]
    max_retries: u32,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Product ids, comma separated.
    #[arg(long, required = true, value_delimiter = ',')]
    products: Vec<String>,

    /// Which files to bundle.
    #[arg(long, value_enum, default_value = "pdf")]
    file_type: FileTypeArg,

    /// Request language. Default: detected from LC_ALL / LANG.
    #[arg(long, env = "DOCSTAMP_LANG", value_enum)]
    lang: Option<LangArg>,

    /// Directory to save the archive in.
    #[arg(short = 'd', long, default_value = ".")]
    dir: PathBuf,

    #[command(flatten)]
    server: ServerArgs,
}

#[derive(Args, Debug)]
struct DownloadArgs {
    /// Job id returned when the job was started.
    task_id: String,

    /// Which files were bundled.
    #[arg(long, value_enum, default_value = "pdf")]
    file_type: FileTypeArg,

    /// Directory to save the archive in.
    #[arg(short = 'd', long, default_value = ".")]
    dir: PathBuf,

    #[command(flatten)]
    server: ServerArgs,
}

#[derive(Args, Debug)]
struct ProgressArgs {
    /// Job id returned when the job was started.
    task_id: String,

    /// Print the probe as JSON.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    server: ServerArgs,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LangArg {
    En,
    Zh,
}

impl From<LangArg> for Language {
    fn from(v: LangArg) -> Self {
        match v {
            LangArg::En => Language::En,
            LangArg::Zh => Language::Zh,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FileTypeArg {
    Pdf,
    Step,
    Bmp,
    Both,
}

impl From<FileTypeArg> for FileType {
    fn from(v: FileTypeArg) -> Self {
        match v {
            FileTypeArg::Pdf => FileType::Pdf,
            FileTypeArg::Step => FileType::Step,
            FileTypeArg::Bmp => FileType::Bmp,
            FileTypeArg::Both => FileType::Both,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose brings everything back.
    let wants_json = matches!(
        &cli.command,
        Command::Watermark(WatermarkArgs { json: true, .. })
            | Command::Progress(ProgressArgs { json: true, .. })
    );
    let show_progress = !cli.quiet && !cli.no_progress && !wants_json;
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

    match cli.command {
        Command::Watermark(ref args) => run_watermark(args, show_progress, cli.quiet).await,
        Command::Fetch(ref args) => run_fetch(args, show_progress, cli.quiet).await,
        Command::Download(ref args) => run_download(args, show_progress, cli.quiet).await,
        Command::Progress(ref args) => run_progress(args).await,
    }
}

async fn run_watermark(args: &WatermarkArgs, show_progress: bool, quiet: bool) -> Result<()> {
    let progress: Option<WatermarkCallback> = if show_progress {
        Some(CliWatermarkProgress::new() as Arc<dyn WatermarkProgressCallback>)
    } else {
        None
    };
    let config = build_watermark_config(args, progress)?;
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_output_name(&args.input)));

    let stats = watermark_to_file(&args.input, &output_path, &config)
        .await
        .context("Watermarking failed")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?
        );
    } else if !quiet {
        eprintln!(
            "{}  {}/{} pages  {}ms  →  {}",
            if stats.failed_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.stamped_pages,
            stats.stamped_pages + stats.failed_pages,
            stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
    }
    Ok(())
}

async fn run_fetch(args: &FetchArgs, show_progress: bool, quiet: bool) -> Result<()> {
    let config = build_compression_config(&args.server)?;
    let client = HttpCompressionClient::new(config.clone()).context("Failed to create HTTP client")?;
    let language = args.lang.map(Language::from).unwrap_or_else(Language::from_env);
    let request = StartRequest::new(&args.products, args.file_type.into(), language);

    let observer = make_observer(show_progress);
    let (job, archive) = start_and_download(&client, &request, config.poll, observer.as_ref())
        .await
        .context("Compression download failed")?;

    let path = archive
        .save_to_dir(&args.dir)
        .await
        .context("Failed to save archive")?;
    report_saved(&path, Some(&job), quiet);
    Ok(())
}

async fn run_download(args: &DownloadArgs, show_progress: bool, quiet: bool) -> Result<()> {
    let config = build_compression_config(&args.server)?;
    let client = HttpCompressionClient::new(config.clone()).context("Failed to create HTTP client")?;
    let job = JobHandle::new(args.task_id.trim());

    let observer = make_observer(show_progress);
    let archive = download_when_ready(
        &client,
        &job,
        args.file_type.into(),
        config.poll,
        observer.as_ref(),
    )
    .await
    .context("Compression download failed")?;

    let path = archive
        .save_to_dir(&args.dir)
        .await
        .context("Failed to save archive")?;
    report_saved(&path, None, quiet);
    Ok(())
}

async fn run_progress(args: &ProgressArgs) -> Result<()> {
    let config = build_compression_config(&args.server)?;
    let client = HttpCompressionClient::new(config).context("Failed to create HTTP client")?;
    let job = JobHandle::new(args.task_id.trim());

    let probe = probe_progress(&client, &job).await;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&probe).context("Failed to serialise progress")?
        );
    }

    match probe {
        ProgressProbe::Known(snapshot) => {
            if !args.json {
                let state = if snapshot.is_completed {
                    green("completed")
                } else if snapshot.is_failed() {
                    red("failed")
                } else {
                    cyan("in progress")
                };
                println!("{}  {:.0}%  {}", bold(job.as_str()), snapshot.progress, state);
                if let Some(msg) = snapshot.error_message {
                    println!("  {}", red(&msg));
                }
            }
            Ok(())
        }
        ProgressProbe::Unknown { reason } => {
            anyhow::bail!("Status of job {} is unknown: {}", job, reason)
        }
    }
}

fn make_observer(show_progress: bool) -> Box<dyn DownloadObserver> {
    if show_progress {
        Box::new(CliDownloadObserver::new())
    } else {
        Box::new(NoopProgressCallback)
    }
}

fn report_saved(path: &Path, job: Option<&JobHandle>, quiet: bool) {
    if quiet {
        return;
    }
    match job {
        Some(job) => eprintln!(
            "{}  job {}  →  {}",
            green("✔"),
            dim(job.as_str()),
            bold(&path.display().to_string())
        ),
        None => eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string())),
    }
}

/// Map CLI args to `WatermarkConfig`.
fn build_watermark_config(
    args: &WatermarkArgs,
    progress: Option<WatermarkCallback>,
) -> Result<WatermarkConfig> {
    let language = args.lang.map(Language::from).unwrap_or_else(Language::from_env);
    let encoding = match args.jpeg_quality {
        Some(quality) => ImageEncoding::Jpeg { quality },
        None => ImageEncoding::Lossless,
    };

    let mut builder = WatermarkConfig::builder()
        .language(language)
        .pages(parse_pages(&args.pages)?)
        .encoding(encoding)
        .skip_failed_pages(args.skip_failed_pages)
        .download_timeout_secs(args.download_timeout);

    if let Some(ref user) = args.user {
        builder = builder.user(user);
    }
    if let Some(ref font) = args.font {
        builder = builder.font_path(font);
    }
    if let Some(ref password) = args.password {
        builder = builder.password(password);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Map CLI args to `CompressionConfig`.
fn build_compression_config(args: &ServerArgs) -> Result<CompressionConfig> {
    let mut builder = CompressionConfig::builder(&args.base_url)
        .request_timeout_secs(args.request_timeout)
        .poll_interval(Duration::from_millis(args.interval_ms))
        .max_poll_retries(args.max_retries);

    if let Some(ref token) = args.csrf_token {
        builder = builder.csrf_token(token);
    }
    if let Some(ref session) = args.session {
        builder = builder.session_cookie(session);
    }

    builder.build().context("Invalid server configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .context(format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pages_forms() {
        assert!(matches!(parse_pages("all").unwrap(), PageSelection::All));
        assert!(matches!(parse_pages(" 5 ").unwrap(), PageSelection::Single(5)));
        assert!(matches!(parse_pages("3-15").unwrap(), PageSelection::Range(3, 15)));
        match parse_pages("1,3,5").unwrap() {
            PageSelection::Set(v) => assert_eq!(v, vec![1, 3, 5]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parse_pages_rejects_bad_input() {
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("9-2").is_err());
        assert!(parse_pages("1,x").is_err());
        assert!(parse_pages("0,2").is_err());
    }

    #[test]
    fn cli_parses_fetch() {
        let cli = Cli::try_parse_from([
            "docstamp",
            "fetch",
            "--products",
            "101,102",
            "--file-type",
            "both",
            "--max-retries",
            "3",
        ])
        .unwrap();
        match cli.command {
            Command::Fetch(args) => {
                assert_eq!(args.products, vec!["101", "102"]);
                assert!(matches!(args.file_type, FileTypeArg::Both));
                assert_eq!(args.server.max_retries, 3);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn server_args_build_config() {
        let args = ServerArgs {
            base_url: "https://parts.example.com".into(),
            csrf_token: Some("t".into()),
            session: None,
            request_timeout: 5,
            interval_ms: 500,
            max_retries: 4,
        };
        let cfg = build_compression_config(&args).unwrap();
        assert_eq!(cfg.poll.interval, Duration::from_millis(500));
        assert_eq!(cfg.poll.max_retries, 4);
        assert_eq!(cfg.csrf_token.as_deref(), Some("t"));
    }
}
