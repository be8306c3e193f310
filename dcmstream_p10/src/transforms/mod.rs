pub mod p10_custom_type_transform;
pub mod p10_filter_transform;
pub mod p10_insert_transform;
pub mod p10_print_transform;
