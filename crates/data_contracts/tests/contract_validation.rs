use data_contracts::{AttributesRecord, PromptGroupFile, ValidationError};

#[test]
fn simple_prompt_file_parses() {
    let raw = r#"{"prompts":["a photo","a painting"],"detectables":[["object"],[]]}"#;
    let group: PromptGroupFile = serde_json::from_str(raw).expect("parse");
    assert_eq!(group.len(), 2);
    assert!(group.categories.is_none());
    assert!(group.validate_annotated(false).is_ok());
    assert_eq!(
        group.validate_annotated(true),
        Err(ValidationError::MissingField("categories"))
    );
}

#[test]
fn short_detectables_rejected() {
    let group = PromptGroupFile {
        prompts: vec!["a".into(), "b".into(), "c".into()],
        detectables: Some(vec![vec!["cat".into()]]),
        categories: None,
    };
    let err = group.validate().unwrap_err();
    assert_eq!(
        err,
        ValidationError::LengthMismatch {
            field: "detectables",
            expected: 3,
            found: 1
        }
    );
}

#[test]
fn held_out_group_needs_no_annotations() {
    let group: PromptGroupFile = serde_json::from_str(r#"{"prompts":["x"]}"#).expect("parse");
    assert!(group.validate().is_ok());
    assert!(group.validate_annotated(false).is_err());
}

#[test]
fn attributes_record_defaults_finegrained() {
    let raw = r#"{"attributes":{"Smiling":1,"Male":-1},"identity":5,"original_filename":"0.jpg"}"#;
    let rec: AttributesRecord = serde_json::from_str(raw).expect("parse");
    assert_eq!(rec.attributes.get("Male"), Some(&-1));
    assert!(rec.finegrained_attributes.is_empty());
    assert_eq!(rec.identity, 5);
}
