pub mod driver_handler;

pub use driver_handler::{
    __path_create_driver, __path_find_nearby_drivers, __path_get_driver,
    __path_get_driver_by_plate, __path_list_drivers, __path_update_driver, create_driver,
    find_nearby_drivers, get_driver, get_driver_by_plate, list_drivers, update_driver,
};
