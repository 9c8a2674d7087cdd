use chrono::Utc;
use clap::Parser;
use iced::widget::{button, canvas, column, container, image, pick_list, row, slider, stack, text, Space};
use iced::{Alignment, Color, ContentFit, Element, Length, Pixels, Size, Task, Theme};
use iced_aw::Wrap;
use rfd::FileDialog;
use std::collections::HashMap;
use tracing::{error, info, warn};
use uuid::Uuid;

mod cli;
mod config;
mod error;
mod logging;
mod raster;
mod relay;
mod state;
mod transform;
mod ui;
mod upload;

use config::Config;
use error::{TransformError, UploadError};
use raster::{CanvasEditor, DataUrl};
use state::data::SketchType;
use state::session::Session;
use state::tool::{Tool, MAX_WIDTH, MIN_WIDTH};
use transform::TransformClient;
use ui::canvas::{SketchPad, StrokeEvent};
use ui::viewer::{download_file_name, ResultViewer};
use upload::UploadedFile;

/// Main application state
struct SketchStudio {
    editor: CanvasEditor,
    /// Texture of the surface, rebuilt when the editor revision changes
    canvas_image: Option<image::Handle>,
    canvas_revision: u64,
    session: Session,
    viewer: ResultViewer,
    client: TransformClient,
    /// History thumbnails keyed by sketch id
    thumbnails: HashMap<Uuid, image::Handle>,
    /// Thumbnails of transform results of saved sketches
    results: HashMap<Uuid, image::Handle>,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// Pointer input over the sketch pad
    Stroke(StrokeEvent),
    SelectTool(Tool),
    SetWidth(u32),
    SketchTypeSelected(SketchType),
    ClearCanvas,
    /// Store the current drawing in the history strip
    SaveSketch,
    /// User clicked "Upload"
    Upload,
    /// Background file read finished
    UploadComplete(Result<UploadedFile, UploadError>),
    /// User clicked "Transform"
    Transform,
    /// Transform a saved sketch from the history strip
    TransformSketch(Uuid),
    /// Backend call for the given sketch resolved
    TransformComplete(Uuid, Result<String, TransformError>),
    ClearResult,
    Download,
    SelectSketch(Uuid),
    DeleteSketch(Uuid),
}

impl SketchStudio {
    /// Create a new instance of the application
    fn new(config: Config, client: TransformClient) -> (Self, Task<Message>) {
        let mut editor = CanvasEditor::new();
        editor.initialize(config.canvas_width, config.canvas_height);

        info!(
            backend = %config.backend_url,
            wire = ?config.wire,
            "sketch studio initialized"
        );

        let mut app = SketchStudio {
            editor,
            canvas_image: None,
            canvas_revision: 0,
            session: Session::new(),
            viewer: ResultViewer::new(),
            client,
            thumbnails: HashMap::new(),
            results: HashMap::new(),
            status: "Ready. Draw something and press Transform.".to_string(),
        };
        app.sync_canvas();

        (app, Task::none())
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        let task = self.handle(message);
        self.sync_canvas();
        task
    }

    fn handle(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Stroke(event) => {
                match event {
                    StrokeEvent::Begin(point) => self.editor.begin_stroke(point),
                    StrokeEvent::Extend(point) => self.editor.extend_stroke(point),
                    StrokeEvent::End => self.editor.end_stroke(),
                }
                Task::none()
            }
            Message::SelectTool(tool) => {
                self.editor.set_tool(tool);
                Task::none()
            }
            Message::SetWidth(width) => {
                self.editor.set_width(width);
                Task::none()
            }
            Message::SketchTypeSelected(sketch_type) => {
                info!(%sketch_type, "sketch type changed");
                self.session.sketch_type = sketch_type;
                Task::none()
            }
            Message::ClearCanvas => {
                self.editor.clear();
                self.status = "Canvas cleared.".to_string();
                Task::none()
            }
            Message::SaveSketch => {
                let image = match self.editor.export_png() {
                    Ok(Some(image)) => image,
                    Ok(None) => return Task::none(),
                    Err(e) => {
                        self.status = format!("Could not export sketch: {}", e);
                        return Task::none();
                    }
                };

                let saved = self.session.save(image);
                let id = saved.id;
                match DataUrl::parse(&saved.image) {
                    Ok(decoded) => {
                        self.thumbnails.insert(id, image::Handle::from_bytes(decoded.bytes));
                    }
                    Err(e) => warn!("no thumbnail for sketch {}: {}", id, e),
                }

                self.status = format!("Saved sketch ({} in history).", self.session.history().len());
                Task::none()
            }
            Message::Upload => {
                // Show the native file picker dialog
                let file = FileDialog::new()
                    .set_title("Select Reference Image")
                    .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp", "bmp"])
                    .pick_file();

                if let Some(path) = file {
                    self.status = format!("Uploading {}...", path.display());

                    // Read and validate off the UI thread
                    return Task::perform(
                        async move { upload::load_from_path(&path).await },
                        Message::UploadComplete,
                    );
                }

                Task::none()
            }
            Message::UploadComplete(Ok(file)) => {
                if let Err(e) = self.editor.load_image(&file.file_url) {
                    error!("upload error: {}", e);
                    self.status = format!("Could not load {}: {}", file.file_name, e);
                    return Task::none();
                }

                self.session.upload(file.file_url);
                self.viewer.clear();
                self.status = format!("Loaded {} ({} bytes).", file.file_name, file.file_size);
                Task::none()
            }
            Message::UploadComplete(Err(e)) => {
                warn!("upload rejected: {}", e);
                self.status = e.to_string();
                Task::none()
            }
            Message::Transform => self.start_transform(),
            Message::TransformSketch(id) => match self.session.begin_saved_transform(id) {
                Ok(Some(image)) => self.submit(id, image),
                Ok(None) => Task::none(),
                Err(e) => {
                    warn!("transform rejected: {}", e);
                    self.status = e.to_string();
                    Task::none()
                }
            },
            Message::TransformComplete(id, result) => {
                self.session.finish_transform(id, &result);
                let is_known = self.session.sketch(id).is_some();

                if let Ok(image) = &result {
                    if self.session.select(id).is_some() {
                        match DataUrl::parse(image) {
                            Ok(decoded) => {
                                self.results.insert(id, image::Handle::from_bytes(decoded.bytes));
                            }
                            Err(e) => warn!("no result thumbnail for sketch {}: {}", id, e),
                        }
                    }
                }

                match result {
                    Ok(image) if is_known => match self.viewer.show(image) {
                        Ok(()) => self.status = "Transform complete.".to_string(),
                        Err(e) => {
                            self.viewer.fail();
                            self.status = format!("Transform failed: {}", e);
                        }
                    },
                    Ok(_) => self.viewer.fail(),
                    Err(e) => {
                        self.viewer.fail();
                        self.status = format!("Transform failed: {}", e);
                    }
                }
                Task::none()
            }
            Message::ClearResult => {
                self.session.clear_result();
                self.viewer.clear();
                Task::none()
            }
            Message::Download => {
                if self.viewer.image().is_none() {
                    return Task::none();
                }

                let target = FileDialog::new()
                    .set_title("Save Result")
                    .set_file_name(download_file_name(Utc::now()))
                    .add_filter("PNG", &["png"])
                    .save_file();

                if let Some(path) = target {
                    self.status = match self.viewer.save_to(&path) {
                        Ok(_) => format!("Saved {}", path.display()),
                        Err(e) => format!("Download failed: {}", e),
                    };
                }
                Task::none()
            }
            Message::SelectSketch(id) => {
                let Some(sketch) = self.session.select(id) else {
                    return Task::none();
                };
                let (image, transformed) = (sketch.image.clone(), sketch.transformed.clone());

                if let Err(e) = self.editor.load_image(&image) {
                    self.status = format!("Could not open sketch: {}", e);
                }

                // Bring back the saved result alongside the sketch
                if let Some(result) = transformed.filter(|_| !self.viewer.is_loading()) {
                    if let Err(e) = self.viewer.show(result) {
                        warn!("could not show saved result: {}", e);
                    }
                }
                Task::none()
            }
            Message::DeleteSketch(id) => {
                if self.session.delete(id) {
                    self.thumbnails.remove(&id);
                    self.results.remove(&id);
                }
                Task::none()
            }
        }
    }

    fn start_transform(&mut self) -> Task<Message> {
        if !self.editor.is_ready() {
            warn!("transform requested before the canvas was ready");
            return Task::none();
        }

        let image = match self.editor.export_png() {
            Ok(Some(image)) => image,
            Ok(None) => return Task::none(),
            Err(e) => {
                self.status = format!("Could not export sketch: {}", e);
                return Task::none();
            }
        };

        let id = match self.session.begin_transform(image.clone()) {
            Ok(id) => id,
            Err(e) => {
                warn!("transform rejected: {}", e);
                self.status = e.to_string();
                return Task::none();
            }
        };

        self.submit(id, image)
    }

    /// Send `image` to the backend on behalf of sketch `id`
    fn submit(&mut self, id: Uuid, image: String) -> Task<Message> {
        self.viewer.start_loading();
        self.status = "Transforming your sketch...".to_string();

        let client = self.client.clone();
        let sketch_type = self.session.sketch_type;
        Task::perform(
            async move { client.submit(&image, sketch_type).await },
            move |result| Message::TransformComplete(id, result),
        )
    }

    /// Rebuild the surface texture after the pixels changed
    fn sync_canvas(&mut self) {
        if self.canvas_image.is_some() && self.canvas_revision == self.editor.revision() {
            return;
        }

        self.canvas_revision = self.editor.revision();
        self.canvas_image = self.editor.surface().map(|surface| {
            image::Handle::from_rgba(surface.width(), surface.height(), surface.as_raw().to_vec())
        });
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let main = if self.viewer.is_visible() {
            row![
                container(self.editor_view()).width(Length::FillPortion(1)),
                container(self.viewer.view()).width(Length::FillPortion(1)),
            ]
        } else {
            row![container(self.editor_view()).width(Length::Fill)]
        };

        column![
            main.height(Length::Fill),
            self.history_view(),
            text(&self.status).size(14),
        ]
        .spacing(12)
        .padding(12)
        .into()
    }

    fn editor_view(&self) -> Element<'_, Message> {
        let tool = self.editor.tool();
        let busy = self.session.is_busy();

        let tool_button = |label: &'static str, choice: Tool| {
            let style: fn(&Theme, button::Status) -> button::Style = if tool.tool == choice {
                button::primary
            } else {
                button::secondary
            };
            button(label).style(style).on_press(Message::SelectTool(choice))
        };

        let toolbar = row![
            tool_button("Pen", Tool::Pen),
            tool_button("Eraser", Tool::Eraser),
            text("Size:").size(14),
            slider(MIN_WIDTH..=MAX_WIDTH, tool.width, Message::SetWidth).width(120.0),
            text(tool.width.to_string()).size(14),
            pick_list(
                SketchType::ALL,
                Some(self.session.sketch_type),
                Message::SketchTypeSelected
            ),
            Space::with_width(Length::Fill),
            button("Upload").on_press(Message::Upload),
            button("Clear").style(button::danger).on_press(Message::ClearCanvas),
            button("Save Sketch").on_press(Message::SaveSketch),
            button(if busy { "Transforming..." } else { "Transform" })
                .on_press_maybe((!busy).then_some(Message::Transform)),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let surface: Element<'_, Message> = match &self.canvas_image {
            Some(handle) => image(handle.clone())
                .content_fit(ContentFit::Fill)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => Space::new(Length::Fill, Length::Fill).into(),
        };

        let pad = canvas(SketchPad {
            surface_size: self
                .editor
                .surface()
                .map_or(Size::new(1, 1), |s| Size::new(s.width(), s.height())),
            tool,
        })
        .width(Length::Fill)
        .height(Length::Fill);

        // Erased pixels are transparent; show them on white like the blank surface
        let drawing = container(stack![surface, pad])
            .width(Length::Fill)
            .height(Length::Fill)
            .style(|_theme: &Theme| container::Style::default().background(Color::WHITE));

        column![toolbar, drawing].spacing(12).into()
    }

    fn history_view(&self) -> Element<'_, Message> {
        if self.session.history().is_empty() {
            return Space::with_height(0.0).into();
        }
        let busy = self.session.is_busy();

        let items: Vec<Element<'_, Message>> = self
            .session
            .history()
            .iter()
            .map(|sketch| {
                // The result stands in for the sketch once there is one
                let handle = self
                    .results
                    .get(&sketch.id)
                    .filter(|_| sketch.transformed.is_some())
                    .or_else(|| self.thumbnails.get(&sketch.id));
                let preview: Element<'_, Message> = match handle {
                    Some(handle) => image(handle.clone()).width(96.0).height(96.0).into(),
                    None => text("sketch").into(),
                };

                let mut details = row![text(sketch.created_at.format("%H:%M:%S").to_string()).size(12)]
                    .spacing(4)
                    .align_y(Alignment::Center);
                if sketch.transformed.is_some() {
                    details = details.push(text("✓ Transformed").size(12));
                }

                column![
                    button(preview).on_press(Message::SelectSketch(sketch.id)),
                    details,
                    row![
                        button(text("Transform").size(12))
                            .style(button::text)
                            .on_press_maybe((!busy).then_some(Message::TransformSketch(sketch.id))),
                        button(text("Delete").size(12))
                            .style(button::text)
                            .on_press(Message::DeleteSketch(sketch.id)),
                    ]
                    .spacing(4),
                ]
                .spacing(4)
                .into()
            })
            .collect();

        Wrap::with_elements(items)
            .spacing(Pixels(8.0))
            .line_spacing(Pixels(8.0))
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Light
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let args = cli::CliArgs::parse();
    let mut config = Config::load()?;
    args.apply(&mut config);

    let client = TransformClient::from_config(&config)?;

    match args.command {
        Some(cli::Command::Relay { .. }) => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(relay::serve(config.relay_addr, client))?;
            Ok(())
        }
        None => run_gui(config, client).map_err(|e| anyhow::anyhow!("{}", e)),
    }
}

fn run_gui(config: Config, client: TransformClient) -> iced::Result {
    iced::application("Sketch Studio", SketchStudio::update, SketchStudio::view)
        .theme(SketchStudio::theme)
        .window_size(Size::new(1280.0, 820.0))
        .centered()
        .run_with(move || SketchStudio::new(config, client))
}
