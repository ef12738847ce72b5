use crate::models::simulation::{CallTrace, RawLog, SimulationResponse};

pub trait LogExtractor {
    fn extract_logs(&self) -> Vec<RawLog>;
}

impl LogExtractor for CallTrace {
    fn extract_logs(&self) -> Vec<RawLog> {
        let mut logs = Vec::new();
        flatten_call_logs(self, &mut logs);
        logs
    }
}

impl LogExtractor for SimulationResponse {
    // Logs of every simulated transaction, in transaction order
    fn extract_logs(&self) -> Vec<RawLog> {
        let mut logs = Vec::new();
        for transaction in &self.transactions {
            flatten_call_logs(&transaction.call_trace, &mut logs);
        }
        logs
    }
}

// Pre-order walk: a frame's own logs come before those of its nested calls
fn flatten_call_logs(frame: &CallTrace, logs: &mut Vec<RawLog>) {
    logs.extend(frame.logs.iter().cloned());

    for nested_call in &frame.calls {
        flatten_call_logs(nested_call, logs);
    }
}
