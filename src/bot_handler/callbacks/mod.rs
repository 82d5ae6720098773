pub mod cancel;
pub mod forgot_password;
pub mod main_menu;
pub mod my_requests;
pub mod new_request;
pub mod register;
pub mod reply;
