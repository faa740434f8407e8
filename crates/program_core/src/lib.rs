pub mod completion;
pub mod domain;
pub mod engine;
pub mod error;
pub mod gate;
pub mod policy;
pub mod ports;
pub mod sessions;
pub mod tracker;

pub use domain::{
    AnswerItem, AnswerProfile, DailySession, DayAccess, DayNumber, DayOverview, NewDailySession,
    Video, VideoStatus, WatchKey, WatchRecord, DAILY_ANSWER_COUNT, PROGRAM_DAYS,
};
pub use engine::ProgramEngine;
pub use error::{ProgramError, ProgramResult};
pub use policy::{NoSkipPolicy, SkipPolicy};
pub use ports::{
    AnswerProfileStore, PortError, PortResult, SessionStore, VideoCatalog, WatchStore,
};
pub use tracker::ProgressReport;
