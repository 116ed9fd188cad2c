pub mod item_image;
pub mod menu_item;
pub mod notification;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod user;
