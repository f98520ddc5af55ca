/// Pipeline stage reported to frontends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesignStage {
    Compiling,
    Routing,
    Sizing,
    Balancing,
    Completed,
}

impl DesignStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesignStage::Compiling => "compiling",
            DesignStage::Routing => "routing",
            DesignStage::Sizing => "sizing",
            DesignStage::Balancing => "balancing",
            DesignStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DesignProgressEvent {
    pub stage: DesignStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
}
