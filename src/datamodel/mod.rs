pub mod anomaly;
pub mod machine_datetime;
pub mod machine_status;
pub mod metric_record;
pub mod metric_series;
pub mod metric_vec;
pub mod prediction;
pub mod view_state;

pub use anomaly::{AnomalyPoint, AnomalyReport, AnomalySummary, MachineAnomalyResult};
pub use machine_datetime::{MachineDateTime, MachineDateTimeExt};
pub use machine_status::{
    MachineOverview, MachineState, MachineStatus, MachineStatusResponse, MachineStop,
    MonitoringRequest, MonitoringState, MonitoringStatus, latest_stop_for_machine, machine_overview,
    parse_machine_stops, stop_history_for_machine,
};
pub use metric_record::{MetricName, MetricRecord};
pub use metric_series::MetricSeries;
pub use metric_vec::{MetricSelection, MetricVec};
pub use view_state::{RefreshTicket, RefreshTracker, ViewState};
