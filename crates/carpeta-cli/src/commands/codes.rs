use carpeta_core::parsing::blocks::PERIOD_FIELD_CODE;
use carpeta_core::parsing::fields::FieldCode;

pub fn list() -> Result<(), carpeta_core::error::CarpetaError> {
    println!("Declaration blocks start at: PERIODO [{PERIOD_FIELD_CODE}] YYYYMM\n");
    println!("Recognized field codes:\n");
    for field in FieldCode::ALL {
        println!("  {}  {:<36} -> {:?}", field.code(), field.gloss(), field);
    }
    println!();
    println!("Other codes on the form are ignored. A code missing from a");
    println!("declaration reads as 0; if it appears twice, the first value wins.");
    Ok(())
}
