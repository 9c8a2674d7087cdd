/// Result viewer: busy indicator, generated image, clear/download actions
use chrono::{DateTime, Utc};
use iced::widget::{button, column, container, image, row, text};
use iced::{Alignment, ContentFit, Element, Length};
use std::path::Path;
use tracing::info;

use crate::error::EncodingError;
use crate::raster::DataUrl;
use crate::Message;

/// A decoded result ready for display
#[derive(Debug, Clone)]
pub struct Shown {
    pub data_url: String,
    handle: image::Handle,
}

/// {empty, loading, showing-result}; every transition is driven by the caller
#[derive(Debug, Clone, Default)]
pub enum ViewerState {
    #[default]
    Empty,
    /// Remembers what was shown so a failed transform can restore it
    Loading { previous: Option<Shown> },
    Showing(Shown),
}

#[derive(Debug, Default)]
pub struct ResultViewer {
    state: ViewerState,
}

/// File name offered when saving a result
pub fn download_file_name(now: DateTime<Utc>) -> String {
    format!("transformed-{}.png", now.timestamp_millis())
}

impl ResultViewer {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ViewerState::Loading { .. })
    }

    /// Data URL of the displayed result
    pub fn image(&self) -> Option<&str> {
        match &self.state {
            ViewerState::Showing(shown) => Some(&shown.data_url),
            _ => None,
        }
    }

    /// Whether the result panel has anything to show
    pub fn is_visible(&self) -> bool {
        !matches!(self.state, ViewerState::Empty)
    }

    pub fn start_loading(&mut self) {
        let previous = match std::mem::take(&mut self.state) {
            ViewerState::Showing(shown) => Some(shown),
            ViewerState::Loading { previous } => previous,
            ViewerState::Empty => None,
        };
        self.state = ViewerState::Loading { previous };
    }

    /// Display a returned image
    pub fn show(&mut self, data_url: String) -> Result<(), EncodingError> {
        let decoded = DataUrl::parse(&data_url)?;
        self.state = ViewerState::Showing(Shown {
            data_url,
            handle: image::Handle::from_bytes(decoded.bytes),
        });
        Ok(())
    }

    /// Return to whatever was displayed before loading started
    pub fn fail(&mut self) {
        if let ViewerState::Loading { previous } = std::mem::take(&mut self.state) {
            self.state = previous.map_or(ViewerState::Empty, ViewerState::Showing);
        }
    }

    /// Drop the displayed result
    pub fn clear(&mut self) {
        if !self.is_loading() {
            self.state = ViewerState::Empty;
        }
    }

    /// Write the displayed image to `path`; `Ok(false)` when nothing is shown
    pub fn save_to(&self, path: &Path) -> Result<bool, EncodingError> {
        let Some(data_url) = self.image() else {
            return Ok(false);
        };

        let decoded = DataUrl::parse(data_url)?;
        std::fs::write(path, &decoded.bytes)?;
        info!("saved result to {}", path.display());
        Ok(true)
    }

    pub fn view(&self) -> Element<'_, Message> {
        let mut header = row![text("Generated Result").size(20)]
            .spacing(12)
            .align_y(Alignment::Center);
        if self.image().is_some() {
            header = header.push(text("✓ Transformed").size(12));
        }

        let body: Element<'_, Message> = match &self.state {
            ViewerState::Loading { .. } => text("Transforming your sketch...").size(16).into(),
            ViewerState::Showing(shown) => image(shown.handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            ViewerState::Empty => column![
                text("No Result Yet").size(18),
                text("Transform your sketch to see the result here").size(14),
            ]
            .spacing(4)
            .align_x(Alignment::Center)
            .into(),
        };

        let has_image = self.image().is_some();
        let actions = row![
            button("Clear Result")
                .on_press_maybe(has_image.then_some(Message::ClearResult))
                .width(Length::Fill),
            button("Download")
                .on_press_maybe(has_image.then_some(Message::Download))
                .width(Length::Fill),
        ]
        .spacing(12);

        column![
            header,
            container(body)
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill),
            actions,
        ]
        .spacing(16)
        .padding(16)
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::CanvasEditor;
    use crate::state::data::SketchType;
    use crate::transform::{client::DEFAULT_TIMEOUT, stub, TransformClient, WireFormat};
    use chrono::TimeZone;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn test_download_file_name_uses_epoch_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(download_file_name(at), "transformed-1700000000123.png");
    }

    #[test]
    fn test_failure_restores_previous_result() {
        let mut viewer = ResultViewer::new();
        viewer.show(PIXEL.to_string()).unwrap();

        viewer.start_loading();
        assert!(viewer.is_loading());
        assert_eq!(viewer.image(), None);

        viewer.fail();
        assert_eq!(viewer.image(), Some(PIXEL));
    }

    #[test]
    fn test_failure_from_empty_returns_to_empty() {
        let mut viewer = ResultViewer::new();
        viewer.start_loading();
        viewer.fail();
        assert!(matches!(viewer.state(), ViewerState::Empty));
        assert!(!viewer.is_visible());
    }

    #[test]
    fn test_show_rejects_non_data_urls() {
        let mut viewer = ResultViewer::new();
        assert!(viewer.show("https://example.com/x.png".into()).is_err());
        assert!(matches!(viewer.state(), ViewerState::Empty));
    }

    #[test]
    fn test_save_to_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(download_file_name(Utc::now()));
        let mut viewer = ResultViewer::new();

        assert!(!viewer.save_to(&path).unwrap());
        assert!(!path.exists());

        viewer.show(PIXEL.to_string()).unwrap();
        assert!(viewer.save_to(&path).unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), DataUrl::parse(PIXEL).unwrap().bytes);
    }

    #[tokio::test]
    async fn test_blank_canvas_through_echo_backend() {
        let mut editor = CanvasEditor::new();
        editor.initialize(64, 64);
        let sketch = editor.export_png().unwrap().unwrap();

        let client = TransformClient::new(stub::json_echo(), WireFormat::Json, DEFAULT_TIMEOUT).unwrap();
        let mut viewer = ResultViewer::new();

        viewer.start_loading();
        assert!(viewer.is_loading());

        let image = client.submit(&sketch, SketchType::Object).await.unwrap();
        viewer.show(image).unwrap();
        assert_eq!(viewer.image(), Some(sketch.as_str()));

        viewer.clear();
        assert!(matches!(viewer.state(), ViewerState::Empty));
    }
}
