pub mod action_dto;
pub mod params;
