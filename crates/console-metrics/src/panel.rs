use serde::{Deserialize, Serialize};

/// Flags hiding parts of the session info panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoPanelOptions {
    pub no_audio_output: bool,
    pub no_session_info: bool,
    pub no_status_info: bool,
    pub no_user_audio: bool,
    pub no_user_video: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceControl {
    UserAudio,
    UserVideo,
    AudioOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum PanelSection {
    Status,
    Devices { controls: Vec<DeviceControl> },
    Session,
}

impl InfoPanelOptions {
    pub fn hides_devices(&self) -> bool {
        self.no_audio_output && self.no_user_audio && self.no_user_video
    }

    pub fn hides_panel(&self) -> bool {
        self.no_status_info && self.hides_devices() && self.no_session_info
    }

    /// Sections to render, top to bottom. Empty when the panel is hidden.
    pub fn layout(&self) -> Vec<PanelSection> {
        let mut sections = Vec::new();
        if self.hides_panel() {
            return sections;
        }

        if !self.no_status_info {
            sections.push(PanelSection::Status);
        }
        if !self.hides_devices() {
            let controls = [
                (self.no_user_audio, DeviceControl::UserAudio),
                (self.no_user_video, DeviceControl::UserVideo),
                (self.no_audio_output, DeviceControl::AudioOutput),
            ]
            .into_iter()
            .filter_map(|(hidden, control)| (!hidden).then_some(control))
            .collect();
            sections.push(PanelSection::Devices { controls });
        }
        if !self.no_session_info {
            sections.push(PanelSection::Session);
        }
        sections
    }
}
