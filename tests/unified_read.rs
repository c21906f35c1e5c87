use sheet_binder::binding::{FieldMap, SheetRecord};
use sheet_binder::ingestion::{read, read_all_sheets, ReadOptions, ReadRequest, SourceFormat};
use sheet_binder::{BindError, BindResult};

#[derive(Debug, Default, PartialEq)]
struct Person {
    id: i64,
    name: String,
}

impl SheetRecord for Person {
    fn field_map() -> BindResult<FieldMap<Self>> {
        FieldMap::builder()
            .field("id", "id", |p: &mut Person, v| p.id = v)
            .field("name", "name", |p: &mut Person, v| p.name = v)
            .build()
    }
}

#[test]
fn read_infers_csv_from_extension() {
    let result = read::<Person>("tests/fixtures/people.csv", "[]", &ReadOptions::default()).unwrap();
    assert_eq!(result.record_count(), 2);
    assert_eq!(result.records[1].name, "Grace");
}

#[test]
fn read_uses_explicit_format_over_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.txt");
    std::fs::write(&path, "name,id\nAda,1\n").unwrap();

    let err = read::<Person>(&path, "[]", &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, BindError::UnsupportedFormat { .. }));

    let opts = ReadOptions {
        format: Some(SourceFormat::Csv),
        ..Default::default()
    };
    let result = read::<Person>(&path, "[]", &opts).unwrap();
    assert_eq!(
        result.records,
        vec![Person {
            id: 1,
            name: "Ada".to_string()
        }]
    );
    assert!(result.errors.get("people").is_some());
}

#[test]
fn read_request_runs_with_its_options() {
    let mut req = ReadRequest::new("tests/fixtures/messy.csv", "messy");
    req.options = ReadOptions::with_trim(false);

    let result = req.run::<Person>().unwrap();
    assert_eq!(result.record_count(), 3);
    assert_eq!(result.errors.len(), 1);
}

#[test]
fn read_all_sheets_of_csv_is_its_only_sheet() {
    let result = read_all_sheets::<Person>("tests/fixtures/people.csv", &ReadOptions::default())
        .unwrap();
    assert_eq!(result.record_count(), 2);
    assert_eq!(result.errors.iter().map(|(s, _)| s).collect::<Vec<_>>(), vec!["people"]);
}

#[cfg(feature = "excel")]
#[test]
fn read_infers_workbook_from_extension() {
    use rust_xlsxwriter::Workbook;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.xlsx");

    let mut wb = Workbook::new();
    for (sheet, name) in [("A", "Ada"), ("B", "Grace")] {
        let ws = wb.add_worksheet();
        ws.set_name(sheet).unwrap();
        ws.write_string(0, 0, "name").unwrap();
        ws.write_string(0, 1, "id").unwrap();
        ws.write_string(1, 0, name).unwrap();
        ws.write_number(1, 1, 1).unwrap();
        ws.write_string(2, 0, "Linus").unwrap();
        ws.write_string(2, 1, "1.5").unwrap();
    }
    wb.save(&path).unwrap();

    let one = read::<Person>(&path, "B", &ReadOptions::default()).unwrap();
    assert_eq!(one.records[0].name, "Grace");
    assert_eq!(one.errors.get("B").unwrap(), ["cannot convert 1.5 to integer @ B3"]);

    let all = read_all_sheets::<Person>(&path, &ReadOptions::default()).unwrap();
    assert_eq!(all.record_count(), 4);
    assert_eq!(all.errors.len(), 2);
}
