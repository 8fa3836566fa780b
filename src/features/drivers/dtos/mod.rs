pub mod driver_dto;

pub use driver_dto::{
    CreateDriverDto, CreateDriverResponseDto, DriverListResponseDto, DriverResponseDto,
    NearbyDriverDto, NearbyDriversQuery, UpdateDriverDto,
};
