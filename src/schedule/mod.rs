pub mod types;
pub mod token;
pub mod calendar;
pub mod slot_utils;
pub mod drag;
pub mod propagation;
pub mod pool;

pub use types::{ContainerId, ContainerMap, PoolId, SalesStaff, Schedule, SlotKey, StaffType};
pub use token::{clone_token, parse_name, type_of, Token, TokenClock, TokenKind};
pub use calendar::MonthKey;
pub use slot_utils::ShiftTemplate;
pub use drag::{DragEngine, DragState, DropAction};
pub use propagation::{CopyCommand, CopyPlan, DaySource};
pub use pool::PoolFilter;
