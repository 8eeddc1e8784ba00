mod command_input;
mod form_panel;
mod input;
mod key_result;

pub use command_input::{CommandEvent, CommandInput};
pub use form_panel::{FieldKind, FieldSpec, FormEvent, FormPanel, SelectOption};
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
