//! UI Components
//!
//! Reusable Leptos components.

mod auth_form;
mod config_panel;
mod header_bar;
mod new_wish_form;
mod remove_wish_button;
mod wish_list;
mod wish_row;

pub use auth_form::{AuthForm, AuthMode};
pub use config_panel::{ConfigPanel, ConfigWarning};
pub use header_bar::{HeaderBar, NoticeBanner};
pub use new_wish_form::NewWishForm;
pub use remove_wish_button::RemoveWishButton;
pub use wish_list::WishList;
pub use wish_row::WishRow;
