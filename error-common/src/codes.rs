// Error codes implementation
// Stable codes attached to every failure surfaced by the intake workspace

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
}

pub mod configuration {
    pub const INVALID_CONFIG: &str = "CONFIG_2001";
    pub const CATALOG_INVALID: &str = "CONFIG_2002";
    pub const FILE_UNREADABLE: &str = "CONFIG_2003";
}

pub mod voice {
    pub const SYNTHESIS_FAILED: &str = "VOICE_5001";
    pub const RECOGNITION_FAILED: &str = "VOICE_5002";
    pub const RECOGNITION_TIMEOUT: &str = "VOICE_5003";
    pub const SLOT_BUSY: &str = "VOICE_5004";
    pub const RETRIES_EXHAUSTED: &str = "VOICE_5005";
}

pub mod collaborator {
    pub const REQUEST_FAILED: &str = "COLLABORATOR_6001";
    pub const BAD_RESPONSE: &str = "COLLABORATOR_6002";
}

pub mod internal {
    pub const UNEXPECTED: &str = "INTERNAL_9001";
}
