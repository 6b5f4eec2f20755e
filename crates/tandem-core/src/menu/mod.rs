//! Role routing: which role-scoped menu a user should see.

pub mod router;

pub use router::{RoleResolution, RoleRouter};

use tandem_types::event::{Keyboard, OutboundMessage};
use tandem_types::user::Role;

/// The keyboard for a role's home menu.
pub fn menu_for(role: Role) -> Keyboard {
    match role {
        Role::Client => Keyboard::ClientMenu,
        Role::Provider => Keyboard::ProviderMenu,
    }
}

/// The standard "you're back in the menu" message for a role.
pub fn menu_message(role: Role) -> OutboundMessage {
    let text = match role {
        Role::Client => "You're in the client menu.",
        Role::Provider => "You're in the provider menu.",
    };
    OutboundMessage::text(text).with_keyboard(menu_for(role))
}
