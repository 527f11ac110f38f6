use jsv::{Schema, Validator};
use serde::Deserialize;
use serde_json::Value;
use std::fs;

#[derive(Deserialize)]
struct TestGroup {
    description: String,
    schema: Value,
    tests: Vec<TestCase>,
}

#[derive(Deserialize)]
struct TestCase {
    description: String,
    data: Value,
    valid: bool,
}

#[test]
fn suite() -> Result<(), failure::Error> {
    let validator = Validator::new();
    let mut failures = vec![];

    let mut paths: Vec<_> = fs::read_dir("tests/suite")?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<_, _>>()?;
    paths.sort();

    for path in paths {
        println!("{:?}", &path);
        let file = fs::read(&path)?;
        let groups: Vec<TestGroup> = serde_json::from_slice(&file)?;

        for group in groups {
            let schema = Schema::compile(&group.schema)?;

            for test_case in group.tests {
                let result = validator.validate(&schema, &test_case.data);
                if result.is_valid() != test_case.valid
                    || validator.is_valid(&schema, &test_case.data) != test_case.valid
                {
                    failures.push(format!(
                        "{:?}: {} / {}: expected valid={}, got {:?}",
                        path,
                        group.description,
                        test_case.description,
                        test_case.valid,
                        result.errors()
                    ));
                }
            }
        }
    }

    assert!(failures.is_empty(), "{:#?}", failures);
    Ok(())
}
