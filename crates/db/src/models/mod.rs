pub mod credit;
pub mod generation_detail;
pub mod generation_task;
pub mod music;
pub mod owner_settings;
pub mod status;
pub mod video;
