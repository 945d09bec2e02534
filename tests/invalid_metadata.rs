//! Configuration-error behavior, isolated in its own binary: building
//! the clashing descriptor panics, so nothing here may trigger
//! auto-registration.

use knotwire::Described;
use knotwire::derive::Codable;

#[derive(Codable, Default, Debug)]
#[codable(default)]
struct Clash {
    #[codable(rename = "same")]
    a: i32,
    #[codable(rename = "same")]
    b: i32,
}

#[test]
#[should_panic(expected = "two fields with wire name")]
fn duplicate_wire_names_are_a_configuration_error() {
    let _ = Clash::type_descriptor();
}
