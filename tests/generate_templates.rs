//! End-to-end generation: project on disk in, xlsx files out, with failures
//! isolated per template.

use std::fs;
use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};

use sactool::config::{
    DateRangeConfig, Dimension, DimensionFilters, DimensionsDoc, Settings, Template, TemplatesDoc,
};
use sactool::services::TemplateComposer;
use sactool::store::ProjectStore;

const PROJECT: &str = "p1";

fn dim(name: &str, sac: &str) -> Dimension {
    Dimension {
        name: name.to_string(),
        sac_name: sac.to_string(),
        table_name: None,
        has_hierarchy: false,
        extract_column: None,
        numeric_sort: false,
        filters: DimensionFilters::default(),
    }
}

fn template(name: &str, columns: &[&str]) -> Template {
    Template {
        name: name.to_string(),
        output_file: None,
        data_rows: None,
        columns: columns.iter().map(|c| c.to_string()).collect(),
        dimension_overrides: Default::default(),
    }
}

fn seeded_store(root: &std::path::Path) -> ProjectStore {
    let store = ProjectStore::new(root);
    store.create_project(PROJECT).unwrap();

    let mut settings = Settings::default();
    settings.name = PROJECT.to_string();
    settings.date_range = Some(DateRangeConfig {
        start_month: "202501".to_string(),
        end_month: "202503".to_string(),
    });
    store.write_settings(PROJECT, &settings).unwrap();

    store
        .write_dimensions(
            PROJECT,
            &DimensionsDoc {
                dimensions: vec![dim("Cost Center", "COL_CC"), dim("Account", "COL_ACCT")],
            },
        )
        .unwrap();
    store
        .write_templates(
            PROJECT,
            &TemplatesDoc {
                templates: vec![
                    template("T1", &["Cost Center"]),
                    // T2 needs a CSV that is never uploaded.
                    template("T2", &["Account"]),
                ],
            },
        )
        .unwrap();
    store
        .save_csv(
            PROJECT,
            "COL_CCMaster.csv",
            b"ID,Description\n100,Alpha\n200,Beta\n300,Gamma\n",
        )
        .unwrap();
    store
}

#[test]
fn generate_isolates_failures_per_template() {
    let root = tempfile::tempdir().unwrap();
    let store = seeded_store(root.path());

    let outcome =
        TemplateComposer::generate(&store, PROJECT, &["T1".to_string(), "T2".to_string()])
            .unwrap();

    assert_eq!(outcome.success.len(), 1);
    assert_eq!(outcome.success[0].name, "T1");
    assert_eq!(outcome.success[0].file, "T1.xlsx");
    assert!(store.output_dir(PROJECT).unwrap().join("T1.xlsx").exists());

    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].name, "T2");
    assert!(
        outcome.failed[0].error.contains("CSV"),
        "error was: {}",
        outcome.failed[0].error
    );
    assert!(!store.output_dir(PROJECT).unwrap().join("T2.xlsx").exists());
}

#[test]
fn empty_selection_generates_all_templates() {
    let root = tempfile::tempdir().unwrap();
    let store = seeded_store(root.path());
    store
        .save_csv(PROJECT, "COL_ACCTMaster.csv", b"ID,Description\n4000,Cash\n")
        .unwrap();

    let outcome = TemplateComposer::generate(&store, PROJECT, &[]).unwrap();
    assert_eq!(outcome.success.len(), 2);
    assert!(outcome.failed.is_empty());
}

#[test]
fn unknown_template_name_becomes_a_failed_entry() {
    let root = tempfile::tempdir().unwrap();
    let store = seeded_store(root.path());

    let outcome = TemplateComposer::generate(&store, PROJECT, &["Ghost".to_string()]).unwrap();
    assert!(outcome.success.is_empty());
    assert_eq!(outcome.failed.len(), 1);
    assert!(outcome.failed[0].error.contains("not found"));
}

#[test]
fn generated_workbook_has_expected_layout() {
    let root = tempfile::tempdir().unwrap();
    let store = seeded_store(root.path());

    let outcome = TemplateComposer::generate(&store, PROJECT, &["T1".to_string()]).unwrap();
    assert_eq!(outcome.failed.len(), 0, "failures: {:?}", outcome.failed);

    let path = store.output_dir(PROJECT).unwrap().join("T1.xlsx");
    let buffer = fs::read(path).unwrap();
    let mut xlsx: Xlsx<_> = open_workbook_from_rs(Cursor::new(&buffer)).unwrap();

    let sheets = xlsx.sheet_names();
    assert!(sheets.contains(&"Upload_to_SAC".to_string()));
    assert!(sheets.contains(&"Cost Center".to_string()));

    // Header row: dimension name, then the three month labels.
    let upload = xlsx.worksheet_range("Upload_to_SAC").unwrap();
    assert_eq!(
        upload.get((0, 0)),
        Some(&Data::String("Cost Center".to_string()))
    );
    assert_eq!(upload.get((0, 1)), Some(&Data::String("202501".to_string())));
    assert_eq!(upload.get((0, 3)), Some(&Data::String("202503".to_string())));

    // Member sheet: title, headers on row 2, members from row 3.
    let members = xlsx.worksheet_range("Cost Center").unwrap();
    assert_eq!(
        members.get((1, 0)),
        Some(&Data::String("Description".to_string()))
    );
    assert_eq!(members.get((1, 1)), Some(&Data::String("ID".to_string())));
    assert_eq!(members.get((2, 0)), Some(&Data::String("Alpha".to_string())));
    assert_eq!(members.get((2, 1)), Some(&Data::String("100".to_string())));
    assert_eq!(members.get((4, 1)), Some(&Data::String("300".to_string())));

    // The dropdown validation lives in the upload sheet's xml.
    let mut zip = zip::ZipArchive::new(Cursor::new(&buffer)).unwrap();
    let mut sheet_xml = String::new();
    {
        use std::io::Read;
        zip.by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut sheet_xml)
            .unwrap();
    }
    assert!(sheet_xml.contains("dataValidation"));
    assert!(sheet_xml.contains("tbl_cost_center_ids"));
}
