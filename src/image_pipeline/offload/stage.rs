use std::fmt;

/// Steps of one offload call, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validating,
    Planning,
    BuildingTables,
    Packing,
    /// Device discovery plus loading and building the kernel binary.
    Connecting,
    Transferring,
    Executing,
    ReadingBack,
    Unpacking,
    Done,
}

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::Validating,
        Stage::Planning,
        Stage::BuildingTables,
        Stage::Packing,
        Stage::Connecting,
        Stage::Transferring,
        Stage::Executing,
        Stage::ReadingBack,
        Stage::Unpacking,
        Stage::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Validating => "validating",
            Stage::Planning => "planning",
            Stage::BuildingTables => "building_tables",
            Stage::Packing => "packing",
            Stage::Connecting => "connecting",
            Stage::Transferring => "transferring",
            Stage::Executing => "executing",
            Stage::ReadingBack => "reading_back",
            Stage::Unpacking => "unpacking",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
