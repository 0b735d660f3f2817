//! Spreadsheet uploads as bytes

use rust_xlsxwriter::Workbook as XlsxWriter;

/// A two-sheet `.xlsx` upload: Reaction rows R1 and R2 referencing Molecule rows.
///
/// R1's substrate cell carries stray whitespace and a trailing comma; R2
/// points at "Molecule Z", which does not exist.
pub fn reaction_xlsx() -> Vec<u8> {
    let mut book = XlsxWriter::new();

    let reactions = book.add_worksheet();
    reactions.set_name("Reaction").unwrap();
    reactions.write_string(0, 0, "REACTION_ID").unwrap();
    reactions.write_string(0, 1, "has_substrate").unwrap();
    reactions.write_string(0, 2, "temperature").unwrap();
    reactions.write_string(1, 0, "R1").unwrap();
    reactions.write_string(1, 1, " Molecule A, Molecule B,").unwrap();
    reactions.write_number(1, 2, 25.0).unwrap();
    reactions.write_string(2, 0, "R2").unwrap();
    reactions.write_string(2, 1, "Molecule A, Molecule Z").unwrap();
    reactions.write_number(2, 2, 30.5).unwrap();

    let molecules = book.add_worksheet();
    molecules.set_name("Molecule").unwrap();
    molecules.write_string(0, 0, "NAME").unwrap();
    molecules.write_string(0, 1, "mass").unwrap();
    molecules.write_string(1, 0, "Molecule A").unwrap();
    molecules.write_number(1, 1, 18.0).unwrap();
    molecules.write_string(2, 0, "Molecule B").unwrap();
    molecules.write_number(2, 1, 44.0).unwrap();

    book.save_to_buffer().unwrap()
}

/// Reaction sheet as CSV; `extra_row` is appended verbatim.
pub fn reaction_csv(extra_row: Option<&str>) -> Vec<u8> {
    let mut text = String::from(
        "REACTION_ID,has_substrate,temperature\nR1,\"Molecule A, Molecule B,\",25\nR2,,30\n",
    );
    if let Some(row) = extra_row {
        text.push_str(row);
        text.push('\n');
    }
    text.into_bytes()
}
