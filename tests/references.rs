use std::rc::Rc;

use knotwire::derive::Codable;
use knotwire::{Codec, DecodeError, EncodeError, Obj, TypeRegistry, obj};

#[derive(Codable, Default, Debug)]
#[codable(default)]
struct Company {
    name: String,
}

#[derive(Codable, Default, Debug)]
#[codable(default)]
struct Department {
    name: String,
    company: Option<Obj<Company>>,
}

#[derive(Codable, Default, Debug)]
#[codable(default)]
struct Directory {
    departments: Vec<Obj<Department>>,
}

#[derive(Codable, Default, Debug)]
#[codable(default)]
struct Node {
    name: String,
    next: Option<Obj<Node>>,
}

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    // Dependency registration pulls in Department and Company.
    registry.register::<Directory>();
    registry.register::<Node>();
    registry
}

#[test]
fn registering_a_root_registers_its_schema() {
    let registry = registry();
    assert!(registry.get_with_name("Directory").is_some());
    assert!(registry.get_with_name("Department").is_some());
    assert!(registry.get_with_name("Company").is_some());
}

#[test]
fn shared_instance_encodes_once_then_as_reference() {
    let registry = registry();
    let codec = Codec::new(&registry);

    let company = obj(Company {
        name: "Acme".into(),
    });
    let directory = obj(Directory {
        departments: vec![
            obj(Department {
                name: "R&D".into(),
                company: Some(company.clone()),
            }),
            obj(Department {
                name: "Sales".into(),
                company: Some(company.clone()),
            }),
        ],
    });

    let text = codec.encode_obj(&directory).unwrap();
    // The company body appears once; the second occurrence is a marker.
    assert_eq!(text.matches("Acme").count(), 1);
    assert_eq!(text.matches("\"$ref\"").count(), 1);
}

#[test]
fn decoding_preserves_shared_identity() {
    let registry = registry();
    let codec = Codec::new(&registry);

    let company = obj(Company {
        name: "Acme".into(),
    });
    let directory = obj(Directory {
        departments: vec![
            obj(Department {
                name: "R&D".into(),
                company: Some(company.clone()),
            }),
            obj(Department {
                name: "Sales".into(),
                company: Some(company),
            }),
        ],
    });

    let text = codec.encode_obj(&directory).unwrap();
    let decoded = codec.decode_obj::<Directory>(&text).unwrap();

    let decoded = decoded.borrow();
    let first = decoded.departments[0].borrow().company.clone().unwrap();
    let second = decoded.departments[1].borrow().company.clone().unwrap();

    // One reconstructed instance, not two equal copies.
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(first.borrow().name, "Acme");
}

#[test]
fn two_instances_with_equal_content_stay_distinct() {
    let registry = registry();
    let codec = Codec::new(&registry);

    let directory = obj(Directory {
        departments: vec![
            obj(Department {
                name: "R&D".into(),
                company: Some(obj(Company {
                    name: "Acme".into(),
                })),
            }),
            obj(Department {
                name: "Sales".into(),
                company: Some(obj(Company {
                    name: "Acme".into(),
                })),
            }),
        ],
    });

    let text = codec.encode_obj(&directory).unwrap();
    // Identity tracking, not structural equality: both bodies expand.
    assert_eq!(text.matches("Acme").count(), 2);
    assert_eq!(text.matches("\"$ref\"").count(), 0);

    let decoded = codec.decode_obj::<Directory>(&text).unwrap();
    let decoded = decoded.borrow();
    let first = decoded.departments[0].borrow().company.clone().unwrap();
    let second = decoded.departments[1].borrow().company.clone().unwrap();
    assert!(!Rc::ptr_eq(&first, &second));
}

#[test]
fn direct_cycle_is_rejected() {
    let registry = registry();
    let codec = Codec::new(&registry);

    let node = obj(Node {
        name: "loop".into(),
        next: None,
    });
    node.borrow_mut().next = Some(node.clone());

    let err = codec.encode_obj(&node).unwrap_err();
    assert!(matches!(err, EncodeError::CircularReference { .. }));

    node.borrow_mut().next = None;
}

#[test]
fn transitive_cycle_is_rejected() {
    let registry = registry();
    let codec = Codec::new(&registry);

    let a = obj(Node {
        name: "a".into(),
        next: None,
    });
    let b = obj(Node {
        name: "b".into(),
        next: Some(a.clone()),
    });
    a.borrow_mut().next = Some(b.clone());

    let err = codec.encode_obj(&a).unwrap_err();
    assert!(matches!(err, EncodeError::CircularReference { .. }));

    a.borrow_mut().next = None;
}

#[test]
fn encoding_failure_does_not_poison_later_sessions() {
    let registry = registry();
    let codec = Codec::new(&registry);

    let node = obj(Node {
        name: "loop".into(),
        next: None,
    });
    node.borrow_mut().next = Some(node.clone());
    codec.encode_obj(&node).unwrap_err();

    // A fresh session over the repaired graph succeeds.
    node.borrow_mut().next = None;
    let text = codec.encode_obj(&node).unwrap();
    assert_eq!(text, r#"{"$id":"ref_1","name":"loop"}"#);
}

#[test]
fn backward_self_reference_decodes_to_one_instance() {
    let registry = registry();
    let codec = Codec::new(&registry);

    // Our encoder rejects cycles, but the wire format can express a
    // backward reference to an object still being populated.
    let text = r#"{"$id":"ref_1","name":"loop","next":{"$ref":"ref_1"}}"#;
    let node = codec.decode_obj::<Node>(text).unwrap();

    let next = node.borrow().next.clone().unwrap();
    assert!(Rc::ptr_eq(&node, &next));

    // Break the Rc cycle so the test does not leak.
    node.borrow_mut().next = None;
}

#[test]
fn unresolved_reference_fails() {
    let registry = registry();
    let codec = Codec::new(&registry);

    let err = codec
        .decode_obj::<Node>(r#"{"$ref":"ref_99"}"#)
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::UnresolvedReference { ref id } if id.as_str() == "ref_99"
    ));
}

#[test]
fn forward_reference_fails() {
    let registry = registry();
    let codec = Codec::new(&registry);

    // `ref_2` is never defined before it is referenced; resolution is a
    // single forward scan.
    let text = r#"{"$id":"ref_1","name":"a","next":{"$ref":"ref_2"}}"#;
    let err = codec.decode_obj::<Node>(text).unwrap_err();

    let DecodeError::Field { field, source, .. } = err else {
        panic!("expected a field-context error, got {err:?}");
    };
    assert_eq!(field, "next");
    assert!(matches!(*source, DecodeError::UnresolvedReference { .. }));
}
