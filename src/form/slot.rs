#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    Repository,
    Source,
    Target,
    Title,
    Issue,
}

impl TextKind {
    pub const ALL: [TextKind; 5] = [
        TextKind::Repository,
        TextKind::Source,
        TextKind::Target,
        TextKind::Title,
        TextKind::Issue,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TextKind::Repository => "Repository",
            TextKind::Source => "Source branch",
            TextKind::Target => "Target branch",
            TextKind::Title => "Title",
            TextKind::Issue => "Issue",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            TextKind::Repository => "owner/repo (auto-detected when empty)",
            TextKind::Source => "main",
            TextKind::Target => "auto-generated when empty",
            TextKind::Title => "optional",
            TextKind::Issue => "optional issue number",
        }
    }
}

/// One addressable data slot. The two buttons are not slots; they are
/// addressed by the cursor flags and live after the last data slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotId {
    ConfigLoader,
    RunTypeToggle,
    Text(TextKind),
    Prompt,
    Context,
}

impl SlotId {
    pub fn label(self) -> &'static str {
        match self {
            SlotId::ConfigLoader => "Load config",
            SlotId::RunTypeToggle => "Run type",
            SlotId::Text(kind) => kind.label(),
            SlotId::Prompt => "Prompt",
            SlotId::Context => "Context",
        }
    }

    /// Slots that own a text buffer and can enter insert mode.
    pub fn is_editable(self) -> bool {
        matches!(self, SlotId::Text(_) | SlotId::Prompt | SlotId::Context)
    }

    pub fn is_multiline(self) -> bool {
        matches!(self, SlotId::Prompt | SlotId::Context)
    }
}

/// What the cursor currently highlights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Slot(SlotId),
    Submit,
    Back,
}

impl Focus {
    pub fn slot(self) -> Option<SlotId> {
        match self {
            Focus::Slot(slot) => Some(slot),
            Focus::Submit | Focus::Back => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Focus::Slot(slot) => slot.label(),
            Focus::Submit => "Submit",
            Focus::Back => "Back",
        }
    }
}
