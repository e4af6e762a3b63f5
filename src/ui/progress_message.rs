#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProgressPhase {
    /// First pass: SHACL prefixes and ontology IRIs
    Scanning,
    /// Second pass: normalize and insert
    Loading,
    /// rdftab mirror table and indexes
    Finalizing,
}

#[derive(Clone, Debug)]
pub enum ProgressMessage {
    Started {
        phase: ProgressPhase,
        total: usize,
    },
    Progress {
        phase: ProgressPhase,
        current: usize,
        file: Option<String>,
    },
    Finished {
        phase: ProgressPhase,
    },
    Warning(String),
}
