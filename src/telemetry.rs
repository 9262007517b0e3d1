//! Opt-in execution reporting: a plain data struct delivered through a sink
//! callback, not a logging/tracing integration.

#[derive(Debug, Clone, Copy)]
pub struct ExecutionTelemetry {
    pub dispatched_instructions: u64,
    pub max_stack_depth: usize,
}

pub type TelemetrySink = Box<dyn Fn(ExecutionTelemetry)>;
