//! Event model for exported session recordings.
//!
//! The rrweb wire format tags every event with a small integer `type`
//! code, incremental events with a `data.source` code, and serialized DOM
//! nodes with a `node.type` code. The tables here mirror those codes.

use serde::{Deserialize, Serialize};

/// Top-level event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Unknown,
    Load,
    FullSnapshot,
    IncrementalSnapshot,
    Meta,
    Custom,
    Plugin,
}

impl EventType {
    /// Map a wire code to an event type
    ///
    /// Unrecognized codes (including the absent-field sentinel -1)
    /// classify as Unknown rather than aborting the pass.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Load,
            2 => Self::FullSnapshot,
            3 => Self::IncrementalSnapshot,
            4 => Self::Meta,
            5 => Self::Custom,
            6 => Self::Plugin,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Load => "Load",
            Self::FullSnapshot => "FullSnapshot",
            Self::IncrementalSnapshot => "IncrementalSnapshot",
            Self::Meta => "Meta",
            Self::Custom => "Custom",
            Self::Plugin => "Plugin",
        }
    }
}

/// Source of an incremental snapshot (`data.source`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncrementalSource {
    Mutation,
    MouseMove,
    MouseInteraction,
    Scroll,
    ViewportResize,
    Input,
    TouchMove,
    MediaInteraction,
    StyleSheetRule,
    CanvasMutation,
    Font,
    Log,
    Drag,
    StyleDeclaration,
    Selection,
    AdoptedStyleSheet,
}

impl IncrementalSource {
    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            0 => Self::Mutation,
            1 => Self::MouseMove,
            2 => Self::MouseInteraction,
            3 => Self::Scroll,
            4 => Self::ViewportResize,
            5 => Self::Input,
            6 => Self::TouchMove,
            7 => Self::MediaInteraction,
            8 => Self::StyleSheetRule,
            9 => Self::CanvasMutation,
            10 => Self::Font,
            11 => Self::Log,
            12 => Self::Drag,
            13 => Self::StyleDeclaration,
            14 => Self::Selection,
            15 => Self::AdoptedStyleSheet,
            _ => return None,
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Mutation => "Mutation",
            Self::MouseMove => "MouseMove",
            Self::MouseInteraction => "MouseInteraction",
            Self::Scroll => "Scroll",
            Self::ViewportResize => "ViewportResize",
            Self::Input => "Input",
            Self::TouchMove => "TouchMove",
            Self::MediaInteraction => "MediaInteraction",
            Self::StyleSheetRule => "StyleSheetRule",
            Self::CanvasMutation => "CanvasMutation",
            Self::Font => "Font",
            Self::Log => "Log",
            Self::Drag => "Drag",
            Self::StyleDeclaration => "StyleDeclaration",
            Self::Selection => "Selection",
            Self::AdoptedStyleSheet => "AdoptedStyleSheet",
        }
    }

    /// Label for any code, recognized or not
    pub fn label_for_code(code: i64) -> String {
        match Self::from_code(code) {
            Some(source) => source.label().to_string(),
            None => format!("Unknown({})", code),
        }
    }
}

/// Serialized DOM node type (`add.node.type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Element,
    Attribute,
    Text,
    Cdata,
    EntityReference,
    Entity,
    ProcessingInstruction,
    Comment,
    Document,
    DocumentType,
    DocumentFragment,
}

impl NodeType {
    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            1 => Self::Element,
            2 => Self::Attribute,
            3 => Self::Text,
            4 => Self::Cdata,
            5 => Self::EntityReference,
            6 => Self::Entity,
            7 => Self::ProcessingInstruction,
            8 => Self::Comment,
            9 => Self::Document,
            10 => Self::DocumentType,
            11 => Self::DocumentFragment,
            _ => return None,
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Element => "Element",
            Self::Attribute => "Attribute",
            Self::Text => "Text",
            Self::Cdata => "CDATA",
            Self::EntityReference => "EntityReference",
            Self::Entity => "Entity",
            Self::ProcessingInstruction => "ProcessingInstruction",
            Self::Comment => "Comment",
            Self::Document => "Document",
            Self::DocumentType => "DocumentType",
            Self::DocumentFragment => "DocumentFragment",
        }
    }

    /// Label for any code, recognized or not
    pub fn label_for_code(code: i64) -> String {
        match Self::from_code(code) {
            Some(node_type) => node_type.label().to_string(),
            None => format!("Unknown({})", code),
        }
    }
}

/// Code used when an event carries no `type` field
pub const MISSING_TYPE_CODE: i64 = -1;

fn missing_type_code() -> i64 {
    MISSING_TYPE_CODE
}

/// A single event record from a recording
///
/// The payload stays a raw `serde_json::Value`: events are wildly
/// heterogeneous and the analysis only inspects a handful of fields.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordingEvent {
    /// Window the event belongs to (multi-tab recordings)
    #[serde(default, rename = "windowId", alias = "window_id")]
    pub window_id: Option<String>,

    /// Wire code of the event type, -1 when absent
    #[serde(default = "missing_type_code", rename = "type")]
    pub type_code: i64,

    /// Event payload, shape depends on the event type
    #[serde(default)]
    pub data: Option<serde_json::Value>,

    /// Capture time in milliseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: Option<i64>,

    /// Replay delay in milliseconds, present on buffered events
    #[serde(default)]
    pub delay: Option<f64>,
}

impl RecordingEvent {
    pub fn event_type(&self) -> EventType {
        EventType::from_code(self.type_code)
    }
}

/// A line of a JSON-lines recording that did not parse
///
/// Chunked exports are routinely cut mid-line; the tail is kept so the
/// report can show where the file was truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnterminatedLine {
    pub file_path: String,
    pub line_index: usize,
    pub line_tail: String,
}
