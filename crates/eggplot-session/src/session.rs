//! The drawing session.
//!
//! Owns the in-memory layer set between import and instruction generation.
//! All mutation goes through one actor task, so recomputation always sees a
//! consistent snapshot of the latest source and configuration:
//!
//! - configuration changes are debounced and coalesced, only the newest
//!   snapshot is recomputed;
//! - selecting a new source (or a new layer-resolution mode) aborts any
//!   in-flight import, so partial results from a superseded file never
//!   surface;
//! - layer edits (visibility, description, reorder) are ordered and never
//!   debounced, so user edits are never dropped.

use eggplot_core::{Error, ImportError, Layer, Result};
use eggplot_import::{Drawing, SvgSegmenter};
use eggplot_protocol::codec;
use eggplot_settings::PlotConfig;
use eggplot_transforms::{Improvements, Pipeline};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{info, warn};

/// Window within which rapid configuration changes are coalesced.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(200);

/// What the session publishes after each recomputation.
#[derive(Debug, Clone, Default)]
pub struct SessionOutput {
    /// Transformed, visible layers in draw order
    pub layers: Vec<Layer>,
    /// Relative metric deltas of the transform run
    pub improvements: Improvements,
    /// Encoded instruction text for the current layers
    pub instructions: String,
    /// Message of the most recent failed import, if the current geometry
    /// predates it
    pub import_error: Option<String>,
}

enum Command {
    SelectSource { svg: String },
    SetConfig { config: PlotConfig },
    SetLayerVisible { index: usize, visible: bool },
    SetLayerDescription { index: usize, description: String },
    MoveLayer { from: usize, to: usize },
}

enum Event {
    Command(Option<Command>),
    DebounceExpired,
    Imported(std::result::Result<std::result::Result<Drawing, ImportError>, JoinError>),
}

#[derive(Debug, Clone)]
struct LayerEntry {
    layer: Layer,
    visible: bool,
}

/// Handle to a running drawing session.
///
/// Cheap to clone; the session task ends when the last handle is dropped.
#[derive(Debug, Clone)]
pub struct CreateSession {
    tx: mpsc::Sender<Command>,
    output: watch::Receiver<SessionOutput>,
}

impl CreateSession {
    /// Spawns the session actor on the current runtime.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(32);
        let (output_tx, output_rx) = watch::channel(SessionOutput::default());
        tokio::spawn(run(rx, output_tx));
        Self {
            tx,
            output: output_rx,
        }
    }

    /// Replaces the source drawing; any in-flight import is superseded.
    pub async fn select_source(&self, svg: String) -> Result<()> {
        self.send(Command::SelectSource { svg }).await
    }

    /// Replaces the configuration. Applied after the debounce window; only
    /// the newest of a burst of changes is recomputed.
    pub async fn set_config(&self, config: PlotConfig) -> Result<()> {
        self.send(Command::SetConfig { config }).await
    }

    /// Shows or hides a layer. Applied immediately, never debounced.
    pub async fn set_layer_visible(&self, index: usize, visible: bool) -> Result<()> {
        self.send(Command::SetLayerVisible { index, visible }).await
    }

    /// Renames a layer. Applied immediately, never debounced.
    pub async fn set_layer_description(&self, index: usize, description: String) -> Result<()> {
        self.send(Command::SetLayerDescription { index, description })
            .await
    }

    /// Moves a layer to a new position in the draw order.
    pub async fn move_layer(&self, from: usize, to: usize) -> Result<()> {
        self.send(Command::MoveLayer { from, to }).await
    }

    /// A receiver of the session's published outputs.
    pub fn subscribe(&self) -> watch::Receiver<SessionOutput> {
        self.output.clone()
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| Error::other("session task is gone"))
    }
}

async fn run(mut rx: mpsc::Receiver<Command>, output: watch::Sender<SessionOutput>) {
    let mut config = PlotConfig::default();
    let mut source: Option<String> = None;
    let mut entries: Vec<LayerEntry> = Vec::new();
    let mut import_error: Option<String> = None;
    let mut pending_config: Option<PlotConfig> = None;
    let mut debounce_at = Instant::now();
    let mut import_task: Option<JoinHandle<std::result::Result<Drawing, ImportError>>> = None;

    loop {
        let event = tokio::select! {
            command = rx.recv() => Event::Command(command),
            _ = tokio::time::sleep_until(debounce_at), if pending_config.is_some() => {
                Event::DebounceExpired
            }
            result = join_import(&mut import_task), if import_task.is_some() => {
                Event::Imported(result)
            }
        };

        match event {
            Event::Command(None) => break,
            Event::Command(Some(command)) => match command {
                Command::SelectSource { svg } => {
                    source = Some(svg.clone());
                    start_import(&mut import_task, svg, &config);
                }
                Command::SetConfig { config: next } => {
                    pending_config = Some(next);
                    debounce_at = Instant::now() + DEBOUNCE_DELAY;
                }
                Command::SetLayerVisible { index, visible } => {
                    if let Some(entry) = entries.get_mut(index) {
                        entry.visible = visible;
                        publish(&output, &config, &entries, &import_error);
                    }
                }
                Command::SetLayerDescription { index, description } => {
                    if let Some(entry) = entries.get_mut(index) {
                        entry.layer.description = description;
                        publish(&output, &config, &entries, &import_error);
                    }
                }
                Command::MoveLayer { from, to } => {
                    if from < entries.len() && to < entries.len() && from != to {
                        let entry = entries.remove(from);
                        entries.insert(to, entry);
                        publish(&output, &config, &entries, &import_error);
                    }
                }
            },
            Event::DebounceExpired => {
                if let Some(next) = pending_config.take() {
                    let resegment = next.layer_resolve_type != config.layer_resolve_type;
                    config = next;
                    match (&source, resegment) {
                        (Some(svg), true) => {
                            // mode change invalidates the imported grouping
                            start_import(&mut import_task, svg.clone(), &config);
                        }
                        _ => publish(&output, &config, &entries, &import_error),
                    }
                }
            }
            Event::Imported(result) => {
                import_task = None;
                match result {
                    Ok(Ok(drawing)) => {
                        info!(
                            layers = drawing.layers.len(),
                            width = drawing.width,
                            height = drawing.height,
                            "source imported"
                        );
                        entries = drawing
                            .layers
                            .into_iter()
                            .map(|layer| LayerEntry {
                                layer,
                                visible: true,
                            })
                            .collect();
                        import_error = None;
                        publish(&output, &config, &entries, &import_error);
                    }
                    Ok(Err(err)) => {
                        // the previous working layer set stays intact
                        warn!(%err, "import failed, keeping current layers");
                        import_error = Some(err.to_string());
                        publish(&output, &config, &entries, &import_error);
                    }
                    Err(join_err) if join_err.is_cancelled() => {}
                    Err(join_err) => warn!(%join_err, "import task failed"),
                }
            }
        }
    }
}

fn start_import(
    import_task: &mut Option<JoinHandle<std::result::Result<Drawing, ImportError>>>,
    svg: String,
    config: &PlotConfig,
) {
    if let Some(task) = import_task.take() {
        task.abort();
    }
    let mode = config.layer_resolve_type;
    *import_task = Some(tokio::spawn(async move {
        SvgSegmenter::segment(&svg, mode)
    }));
}

async fn join_import(
    import_task: &mut Option<JoinHandle<std::result::Result<Drawing, ImportError>>>,
) -> std::result::Result<std::result::Result<Drawing, ImportError>, JoinError> {
    match import_task.as_mut() {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

fn publish(
    output: &watch::Sender<SessionOutput>,
    config: &PlotConfig,
    entries: &[LayerEntry],
    import_error: &Option<String>,
) {
    let visible: Vec<Layer> = entries
        .iter()
        .filter(|entry| entry.visible)
        .map(|entry| entry.layer.clone())
        .collect();
    let (layers, improvements) =
        Pipeline::apply_with_improvements(&config.pipeline_options(), &visible);
    let instructions = codec::encode(&layers);
    let _ = output.send(SessionOutput {
        layers,
        improvements,
        instructions,
        import_error: import_error.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use eggplot_core::LayerResolveMode;
    use tokio::time::sleep;

    const TRIANGLE: &str =
        r#"<svg width="10" height="10"><path d="M0,0 L10,0 L10,10 Z"/></svg>"#;

    const TWO_COLORS: &str = r#"<svg>
        <line x1="0" y1="0" x2="10" y2="0" stroke="red"/>
        <line x1="0" y1="5" x2="10" y2="5" stroke="blue"/>
    </svg>"#;

    fn color_config() -> PlotConfig {
        let mut config = PlotConfig::default();
        config.layer_resolve_type = LayerResolveMode::Color;
        config.optimize_travel = false;
        config.merge_segments = false;
        config.simplify_segments = false;
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_import_publishes_output() {
        let session = CreateSession::spawn();
        let mut output = session.subscribe();

        session.select_source(TRIANGLE.to_string()).await.unwrap();
        let out = output
            .wait_for(|o| !o.layers.is_empty())
            .await
            .unwrap()
            .clone();
        assert_eq!(out.layers.len(), 1);
        assert!(out.instructions.contains("P1"));
        assert!(out.import_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_config_changes_coalesce_to_latest() {
        let session = CreateSession::spawn();
        let mut output = session.subscribe();

        session.select_source(TRIANGLE.to_string()).await.unwrap();
        output.wait_for(|o| !o.layers.is_empty()).await.unwrap();

        let mut a = color_config();
        a.layer_resolve_type = LayerResolveMode::None;
        a.v_offset = 100.0;
        let mut b = a.clone();
        b.v_offset = 300.0;
        session.set_config(a).await.unwrap();
        session.set_config(b).await.unwrap();

        let out = output
            .wait_for(|o| o.layers.iter().any(|l| l.segments[0].points[0].y >= 300.0))
            .await
            .unwrap()
            .clone();
        // only the newest config was applied
        assert_eq!(out.layers[0].segments[0].points[0].y, 300.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_import_keeps_layers() {
        let session = CreateSession::spawn();
        let mut output = session.subscribe();

        session.select_source(TRIANGLE.to_string()).await.unwrap();
        output.wait_for(|o| !o.layers.is_empty()).await.unwrap();

        session.select_source("<html></html>".to_string()).await.unwrap();
        let out = output
            .wait_for(|o| o.import_error.is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(out.layers.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_layer_visibility_and_reorder() {
        let session = CreateSession::spawn();
        let mut output = session.subscribe();

        session.set_config(color_config()).await.unwrap();
        sleep(DEBOUNCE_DELAY * 2).await;
        session.select_source(TWO_COLORS.to_string()).await.unwrap();
        output.wait_for(|o| o.layers.len() == 2).await.unwrap();

        session.move_layer(1, 0).await.unwrap();
        let out = output
            .wait_for(|o| o.layers[0].description == "blue")
            .await
            .unwrap()
            .clone();
        assert_eq!(out.layers[1].description, "red");

        session.set_layer_visible(1, false).await.unwrap();
        let out = output.wait_for(|o| o.layers.len() == 1).await.unwrap().clone();
        assert_eq!(out.layers[0].description, "blue");
        // single remaining layer means no switch instruction
        assert!(!out.instructions.contains("S "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rename_layer() {
        let session = CreateSession::spawn();
        let mut output = session.subscribe();

        session.set_config(color_config()).await.unwrap();
        sleep(DEBOUNCE_DELAY * 2).await;
        session.select_source(TWO_COLORS.to_string()).await.unwrap();
        output.wait_for(|o| o.layers.len() == 2).await.unwrap();

        session
            .set_layer_description(0, "outline pen".to_string())
            .await
            .unwrap();
        let out = output
            .wait_for(|o| o.layers[0].description == "outline pen")
            .await
            .unwrap()
            .clone();
        assert!(out.instructions.contains("S outline pen"));
    }
}
