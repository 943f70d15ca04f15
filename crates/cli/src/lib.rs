use annotator_core::transform::to_user_space;
use annotator_core::{
    Annotation, CanvasOrigin, Editor, EditorConfig, ExportArtifact, ExportHost, Interaction,
    Notification, NotificationLevel, PointerInput, ScreenPoint, Status, Tool,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdf_engine::{default_engine, LopdfEngine, OpenSource};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "annotator")]
#[command(about = "PDF annotation overlay and bake tool")]
pub struct Cli {
    /// Editor settings file (`key = value` lines); defaults to ANNOTATOR_* variables
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable page geometry.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the draw commands a bake would issue.
    Plan {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// JSON array of annotations
        #[arg(long, value_name = "JSON")]
        annotations: PathBuf,
    },
    /// Draw annotations into a new copy of the PDF.
    Bake {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// JSON array of annotations
        #[arg(long, value_name = "JSON")]
        annotations: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also write the baked annotation list as JSON
        #[arg(long, value_name = "JSON")]
        emit_annotations: Option<PathBuf>,
    },
    /// Drive an editing session from a JSON list of UI actions.
    Replay {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, value_name = "JSON")]
        script: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    pages: Vec<PageOutput>,
}

#[derive(Debug, Serialize)]
struct PageOutput {
    page: u32,
    width: f32,
    height: f32,
}

#[derive(Debug, Serialize)]
struct BakeOutput {
    output: String,
    page_count: u32,
    annotations_drawn: usize,
    annotations_skipped: usize,
}

/// One scripted UI action for `replay`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ScriptAction {
    Tool { tool: Tool },
    PointerDown {
        x: f32,
        y: f32,
        #[serde(default)]
        origin: CanvasOrigin,
    },
    PointerUp {
        x: f32,
        y: f32,
        #[serde(default)]
        origin: CanvasOrigin,
    },
    /// Click on whatever overlay box lies under the pointer
    ClickAnnotation {
        x: f32,
        y: f32,
        #[serde(default)]
        origin: CanvasOrigin,
    },
    EditText { text: String },
    CancelEdit,
    DeleteSelected,
    Clear,
    ZoomIn,
    ZoomOut,
    Zoom { percent: u16 },
    NextPage,
    PreviousPage,
    GoToPage { page: u32 },
    Save,
}

#[derive(Debug, Serialize)]
struct ReplayStep {
    step: usize,
    outcome: &'static str,
}

#[derive(Debug, Serialize)]
struct ReplayOutput {
    steps: Vec<ReplayStep>,
    notifications: Vec<Notification>,
    status: Status,
    annotations: Vec<Annotation>,
}

/// Host side of an export: writes the artifact to disk and keeps notifications
struct FileHost {
    output: PathBuf,
    saved: Option<Vec<Annotation>>,
    notifications: Vec<Notification>,
}

impl FileHost {
    fn new(output: PathBuf) -> Self {
        Self { output, saved: None, notifications: Vec::new() }
    }
}

impl ExportHost for FileHost {
    fn on_save(&mut self, _bytes: &[u8], annotations: &[Annotation]) {
        self.saved = Some(annotations.to_vec());
    }

    fn download(&mut self, artifact: &ExportArtifact) -> io::Result<()> {
        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.output, &artifact.bytes)?;
        log::info!("wrote {} bytes to {}", artifact.bytes.len(), self.output.display());
        Ok(())
    }

    fn notify(&mut self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => log::info!("{}: {}", notification.title, notification.description),
            NotificationLevel::Error => log::warn!("{}: {}", notification.title, notification.description),
        }
        self.notifications.push(notification);
    }
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Plan { file, annotations } => run_plan(&file, &annotations),
        Commands::Bake { file, annotations, output, emit_annotations } => {
            let config = load_config(cli.config.as_deref())?;
            run_bake(&file, &annotations, output, emit_annotations.as_deref(), config)
        }
        Commands::Replay { file, script, output } => {
            let config = load_config(cli.config.as_deref())?;
            run_replay(&file, &script, output, config)
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_info(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    let engine = default_engine();
    let (_, sizes) = engine.open(OpenSource::from(file)).context("failed to open PDF")?;

    let pages = sizes
        .iter()
        .zip(1..)
        .map(|(size, page)| PageOutput { page, width: size.width, height: size.height })
        .collect::<Vec<_>>();
    let payload =
        InfoOutput { path: file.display().to_string(), page_count: pages.len() as u32, pages };

    print_json(&payload)
}

fn run_plan(file: &Path, annotations: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;
    let annotations = read_annotations(annotations)?;

    let engine = default_engine();
    let bytes = OpenSource::from(file).into_bytes().context("failed to read PDF")?;
    let plan = engine.plan(&bytes, &annotations).context("failed to open PDF")?;

    print_json(&plan)
}

fn run_bake(
    file: &Path,
    annotations_path: &Path,
    output: Option<PathBuf>,
    emit_annotations: Option<&Path>,
    config: EditorConfig,
) -> Result<()> {
    ensure_pdf_exists(file)?;
    let annotations = read_annotations(annotations_path)?;
    let output = resolve_output(file, output, &config)?;

    let mut editor = open_editor(file, config)?;
    editor.import_annotations(annotations);

    let bytes = editor.document().loaded().map(|doc| doc.bytes().to_vec()).unwrap_or_default();
    let plan = editor.backend().plan(&bytes, editor.annotations()).context("failed to open PDF")?;

    let mut host = FileHost::new(output.clone());
    editor.save(&mut host).context("failed to save annotated PDF")?;

    if let (Some(path), Some(saved)) = (emit_annotations, host.saved.as_ref()) {
        let json = serde_json::to_string_pretty(saved)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write annotations to {}", path.display()))?;
    }

    print_json(&BakeOutput {
        output: output.display().to_string(),
        page_count: editor.page_count(),
        annotations_drawn: plan.drawn,
        annotations_skipped: plan.skipped.len(),
    })
}

fn run_replay(file: &Path, script: &Path, output: Option<PathBuf>, config: EditorConfig) -> Result<()> {
    ensure_pdf_exists(file)?;
    let contents = fs::read_to_string(script)
        .with_context(|| format!("failed to read script {}", script.display()))?;
    let actions: Vec<ScriptAction> =
        serde_json::from_str(&contents).context("script is not a valid action list")?;
    let output = resolve_output(file, output, &config)?;

    let mut editor = open_editor(file, config)?;
    let mut host = FileHost::new(output);
    let mut steps = Vec::with_capacity(actions.len());

    for (index, action) in actions.into_iter().enumerate() {
        let outcome = apply_action(&mut editor, &mut host, action);
        log::debug!("step {index}: {outcome}");
        steps.push(ReplayStep { step: index + 1, outcome });
    }

    print_json(&ReplayOutput {
        steps,
        notifications: host.notifications,
        status: editor.status(),
        annotations: editor.annotations().to_vec(),
    })
}

fn apply_action(
    editor: &mut Editor<LopdfEngine>,
    host: &mut FileHost,
    action: ScriptAction,
) -> &'static str {
    match action {
        ScriptAction::Tool { tool } => {
            editor.set_tool(tool);
            "tool"
        }
        ScriptAction::PointerDown { x, y, origin } => {
            describe(editor.pointer_down(PointerInput::new(ScreenPoint::new(x, y), origin)))
        }
        ScriptAction::PointerUp { x, y, origin } => {
            describe(editor.pointer_up(PointerInput::new(ScreenPoint::new(x, y), origin)))
        }
        ScriptAction::ClickAnnotation { x, y, origin } => {
            let point = to_user_space(ScreenPoint::new(x, y), origin, editor.scale());
            let hit = editor.store().hit_test(editor.current_page(), &point).map(Annotation::id);
            match hit {
                Some(id) => describe(editor.annotation_clicked(id)),
                None => describe(Interaction::Ignored),
            }
        }
        ScriptAction::EditText { text } => {
            if editor.set_text_draft(text) && editor.commit_text_edit() {
                "text_updated"
            } else {
                "ignored"
            }
        }
        ScriptAction::CancelEdit => {
            editor.cancel_text_edit();
            "edit_cancelled"
        }
        ScriptAction::DeleteSelected => match editor.delete_selected() {
            Some(_) => "deleted",
            None => "ignored",
        },
        ScriptAction::Clear => {
            editor.clear_annotations();
            "cleared"
        }
        ScriptAction::ZoomIn => {
            editor.zoom_in();
            "zoom"
        }
        ScriptAction::ZoomOut => {
            editor.zoom_out();
            "zoom"
        }
        ScriptAction::Zoom { percent } => {
            editor.set_zoom_percent(percent);
            "zoom"
        }
        ScriptAction::NextPage => {
            editor.next_page();
            "page"
        }
        ScriptAction::PreviousPage => {
            editor.previous_page();
            "page"
        }
        ScriptAction::GoToPage { page } => {
            editor.go_to_page(page);
            "page"
        }
        ScriptAction::Save => match editor.save(host) {
            Ok(()) => "saved",
            Err(_) => "save_failed",
        },
    }
}

fn describe(interaction: Interaction) -> &'static str {
    match interaction {
        Interaction::DragStarted => "drag_started",
        Interaction::Created(_) => "created",
        Interaction::Discarded => "discarded",
        Interaction::Toggled(_) => "toggled",
        Interaction::EditText(_) => "edit_text",
        Interaction::Selected(_) => "selected",
        Interaction::Ignored => "ignored",
    }
}

fn open_editor(file: &Path, config: EditorConfig) -> Result<Editor<LopdfEngine>> {
    let bytes = OpenSource::from(file).into_bytes().context("failed to read PDF")?;
    let mut editor =
        Editor::with_config(default_engine(), config).context("invalid editor configuration")?;
    editor.load(bytes).context("failed to open PDF")?;
    Ok(editor)
}

/// Where the annotated copy goes; never the source file itself
///
/// Without `--output` the configured export name is used next to the input,
/// falling back to `<stem>-annotated.pdf` when that name is the input.
fn resolve_output(file: &Path, output: Option<PathBuf>, config: &EditorConfig) -> Result<PathBuf> {
    if let Some(output) = output {
        if is_same_file(file, &output) {
            anyhow::bail!("output would overwrite the source PDF: {}", output.display());
        }
        return Ok(output);
    }

    let default = file.with_file_name(&config.export_file_name);
    if !is_same_file(file, &default) {
        return Ok(default);
    }

    let stem = file.file_stem().map(|stem| stem.to_string_lossy()).unwrap_or_default();
    let fallback = file.with_file_name(format!("{stem}-annotated.pdf"));
    log::info!("{} is the input; writing {} instead", default.display(), fallback.display());
    Ok(fallback)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    match path {
        Some(path) => EditorConfig::from_file(path)
            .with_context(|| format!("failed to read config {}", path.display())),
        None => EditorConfig::from_env().context("invalid ANNOTATOR_* environment"),
    }
}

fn read_annotations(path: &Path) -> Result<Vec<Annotation>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read annotations {}", path.display()))?;
    serde_json::from_str(&contents).context("annotations are not a valid JSON list")
}

fn print_json<T: Serialize>(payload: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(payload)?;
    println!("{json}");
    Ok(())
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}
