use pretty_assertions::assert_eq;
use sm83_rs::asm::{encode_line, parse_statement, Unrecognized};
use sm83_rs::{assemble, AsmConfig, AsmError, NumericError, OperandClass};

fn enc(line: &str) -> Vec<u8> {
    encode_line(line).unwrap().unwrap_or_else(|| panic!("no form for `{line}`"))
}

#[test]
fn bit_exact_fixtures() {
    assert_eq!(enc("NOP"), vec![0x00]);
    assert_eq!(enc("LD B, C"), vec![0x41]);
    assert_eq!(enc("LD BC, 0x1234"), vec![0x01, 0x34, 0x12]);
    assert_eq!(enc("JR -5"), vec![0x18, 0xFB]);
    assert_eq!(enc("BIT 3, A"), vec![0xCB, 0x5F]);
}

#[test]
fn case_and_whitespace_are_normalized() {
    assert_eq!(enc("  ld   b,c  "), vec![0x41]);
    assert_eq!(enc("ld hl, sp + 5"), vec![0xF8, 0x05]);
    assert_eq!(enc("Ld A, [ hl+ ]"), vec![0x2A]);
    assert_eq!(enc("halt ; wait for interrupt"), vec![0x76]);
}

#[test]
fn fixed_literal_forms() {
    assert_eq!(enc("JP HL"), vec![0xE9]);
    assert_eq!(enc("LDH [C], A"), vec![0xE2]);
    assert_eq!(enc("LDH A, [C]"), vec![0xF2]);
    assert_eq!(enc("LD SP, HL"), vec![0xF9]);
}

#[test]
fn single_byte_immediates() {
    assert_eq!(enc("JR 127"), vec![0x18, 0x7F]);
    assert_eq!(enc("ADD SP, -128"), vec![0xE8, 0x80]);
    assert_eq!(enc("LDH [0x80], A"), vec![0xE0, 0x80]);
    assert_eq!(enc("LDH A, [255]"), vec![0xF0, 0xFF]);
    assert_eq!(enc("LD HL, SP-2"), vec![0xF8, 0xFE]);
    assert_eq!(enc("LD B, 0x12"), vec![0x06, 0x12]);
    assert_eq!(enc("CP A, 10"), vec![0xFE, 0x0A]);
    assert_eq!(enc("JR NZ, -2"), vec![0x20, 0xFE]);
    assert_eq!(enc("JR 0x10"), vec![0x18, 0x10]);
}

#[test]
fn stop_uses_its_own_operand() {
    assert_eq!(enc("STOP 0"), vec![0x10, 0x00]);
    assert_eq!(enc("STOP 0x7F"), vec![0x10, 0x7F]);
    // Preceded by a conditional call, whose operand must not leak into STOP.
    let asm = assemble("CALL NZ, 0x1234\nSTOP 5\n", &AsmConfig::default()).unwrap();
    assert_eq!(asm.bytes, vec![0xC4, 0x34, 0x12, 0x10, 0x05]);
}

#[test]
fn sixteen_bit_immediates_little_endian() {
    assert_eq!(enc("LD [0xC000], SP"), vec![0x08, 0x00, 0xC0]);
    assert_eq!(enc("JP 0x0150"), vec![0xC3, 0x50, 0x01]);
    assert_eq!(enc("CALL 4660"), vec![0xCD, 0x34, 0x12]);
    assert_eq!(enc("LD [0xFF80], A"), vec![0xEA, 0x80, 0xFF]);
    assert_eq!(enc("LD A, [0xFF80]"), vec![0xFA, 0x80, 0xFF]);
    assert_eq!(enc("JP C, 0x1234"), vec![0xDA, 0x34, 0x12]);
    assert_eq!(enc("CALL Z, 0x1234"), vec![0xCC, 0x34, 0x12]);
    assert_eq!(enc("LD SP, 0xFFFE"), vec![0x31, 0xFE, 0xFF]);
}

#[test]
fn prefixed_page() {
    assert_eq!(enc("RLC B"), vec![0xCB, 0x00]);
    assert_eq!(enc("SWAP A"), vec![0xCB, 0x37]);
    assert_eq!(enc("SRL [HL]"), vec![0xCB, 0x3E]);
    assert_eq!(enc("RES 0, [HL]"), vec![0xCB, 0x86]);
    assert_eq!(enc("SET 7, L"), vec![0xCB, 0xFD]);
}

#[test]
fn field_parametrized_forms() {
    assert_eq!(enc("LD [DE], A"), vec![0x12]);
    assert_eq!(enc("INC SP"), vec![0x33]);
    assert_eq!(enc("ADD HL, DE"), vec![0x19]);
    assert_eq!(enc("LD A, [HL-]"), vec![0x3A]);
    assert_eq!(enc("DEC BC"), vec![0x0B]);
    assert_eq!(enc("INC A"), vec![0x3C]);
    assert_eq!(enc("DEC [HL]"), vec![0x35]);
    assert_eq!(enc("XOR A, A"), vec![0xAF]);
    assert_eq!(enc("RET NC"), vec![0xD0]);
    assert_eq!(enc("POP AF"), vec![0xF1]);
    assert_eq!(enc("PUSH HL"), vec![0xE5]);
    assert_eq!(enc("RST 0x38"), vec![0xFF]);
    assert_eq!(enc("RST 8"), vec![0xCF]);
}

// Pairs of forms whose textual shapes overlap; the catalogue order decides.
#[test]
fn ambiguous_pairs_resolve_deterministically() {
    // register vs register pair immediate load
    assert_eq!(enc("LD B, 5"), vec![0x06, 0x05]);
    assert_eq!(enc("LD BC, 5"), vec![0x01, 0x05, 0x00]);
    // [hl] as an 8-bit register vs the post-increment/decrement pair forms
    assert_eq!(enc("LD A, [HL]"), vec![0x7E]);
    assert_eq!(enc("LD A, [HL+]"), vec![0x2A]);
    assert_eq!(enc("LD [HL], A"), vec![0x77]);
    assert_eq!(enc("LD [HL-], A"), vec![0x32]);
    // register-pair vs register increment
    assert_eq!(enc("INC HL"), vec![0x23]);
    assert_eq!(enc("INC H"), vec![0x24]);
    assert_eq!(enc("INC [HL]"), vec![0x34]);
    // fixed literal vs parametrized neighbours
    assert_eq!(enc("JP HL"), vec![0xE9]);
    assert_eq!(enc("JP 0x10"), vec![0xC3, 0x10, 0x00]);
    assert_eq!(enc("LDH [C], A"), vec![0xE2]);
    assert_eq!(enc("LDH [0x0C], A"), vec![0xE0, 0x0C]);
    assert_eq!(enc("RET"), vec![0xC9]);
    assert_eq!(enc("RET C"), vec![0xD8]);
    assert_eq!(enc("JR 5"), vec![0x18, 0x05]);
    assert_eq!(enc("JR C, 5"), vec![0x38, 0x05]);
    // add family
    assert_eq!(enc("ADD HL, SP"), vec![0x39]);
    assert_eq!(enc("ADD A, L"), vec![0x85]);
    assert_eq!(enc("ADD A, 5"), vec![0xC6, 0x05]);
    assert_eq!(enc("ADD SP, 5"), vec![0xE8, 0x05]);
    // stack-relative load vs register-pair immediate and sp <- hl
    assert_eq!(enc("LD HL, SP+0"), vec![0xF8, 0x00]);
    assert_eq!(enc("LD HL, 0"), vec![0x21, 0x00, 0x00]);
    // accumulator rotate vs prefixed rotate
    assert_eq!(enc("RLA"), vec![0x17]);
    assert_eq!(enc("RL A"), vec![0xCB, 0x17]);
    // direct address load vs indirect pair load
    assert_eq!(enc("LD A, [0x1234]"), vec![0xFA, 0x34, 0x12]);
    assert_eq!(enc("LD A, [BC]"), vec![0x0A]);
}

#[test]
fn halt_slot_is_not_a_load() {
    assert_eq!(encode_line("LD [HL], [HL]").unwrap(), None);
}

#[test]
fn numeric_errors_are_fatal_with_line_numbers() {
    let src = "NOP\nLD A, 0XZZ\nNOP\n";
    let err = assemble(src, &AsmConfig::default()).unwrap_err();
    assert_eq!(
        err,
        AsmError::Numeric { line: 2, source: NumericError::Invalid("0XZZ".into()) }
    );
    assert_eq!(err.to_string(), "line 2: invalid numeric literal `0XZZ`");

    let err = assemble("JR 200", &AsmConfig::default()).unwrap_err();
    assert_eq!(
        err,
        AsmError::Numeric {
            line: 1,
            source: NumericError::OutOfRange { value: 200, class: OperandClass::SignedDisplacement8 },
        }
    );
    assert!(matches!(
        assemble("LD A, 256", &AsmConfig::default()),
        Err(AsmError::Numeric { line: 1, .. })
    ));
    assert!(matches!(
        assemble("BIT 8, A", &AsmConfig::default()),
        Err(AsmError::Numeric { line: 1, .. })
    ));
}

#[test]
fn unrecognized_lines_are_collected() {
    let src = "NOP\nFROB A\n\n; comment only\nLD A, FOO\nHALT\n";
    let asm = assemble(src, &AsmConfig::default()).unwrap();
    assert_eq!(asm.bytes, vec![0x00, 0x76]);
    assert!(!asm.is_clean());
    assert_eq!(
        asm.unrecognized,
        vec![
            Unrecognized { line: 2, text: "FROB A".into() },
            Unrecognized { line: 5, text: "LD A, FOO".into() },
        ]
    );
    assert_eq!(asm.unrecognized[0].to_string(), "line 2: unrecognized instruction `FROB A`");
}

#[test]
fn strict_mode_fails_fast() {
    let src = "NOP\nFROB A\nBOGUS\n";
    let err = assemble(src, &AsmConfig { strict: true }).unwrap_err();
    assert_eq!(err, AsmError::Unrecognized { line: 2, text: "FROB A".into() });
}

#[test]
fn blank_and_comment_lines_are_skipped() {
    assert_eq!(parse_statement("   "), None);
    assert_eq!(parse_statement("; only a comment"), None);
    let st = parse_statement("ld a , [ hl+ ] ; tail").unwrap();
    assert_eq!(st.mnemonic, "LD");
    assert_eq!(st.operands, vec!["A".to_string(), "[HL+]".to_string()]);
    assert_eq!(encode_line("").unwrap(), Some(Vec::new()));
}

#[test]
fn source_order_is_preserved() {
    let src = "LD SP, 0xFFFE\nLD A, 0x01\nLDH [0x40], A\nJR -2\n";
    let asm = assemble(src, &AsmConfig::default()).unwrap();
    assert_eq!(asm.bytes, vec![0x31, 0xFE, 0xFF, 0x3E, 0x01, 0xE0, 0x40, 0x18, 0xFE]);
    assert!(asm.is_clean());
}

#[test]
fn stack_offset_takes_hex_magnitudes() {
    assert_eq!(enc("LD HL, SP+0x10"), vec![0xF8, 0x10]);
    assert_eq!(enc("ld hl, sp - 0x80"), vec![0xF8, 0x80]);
    assert_eq!(enc("ADD SP, 0x10"), vec![0xE8, 0x10]);
    assert_eq!(
        encode_line("LD HL, SP+0x80"),
        Err(NumericError::OutOfRange { value: 128, class: OperandClass::SignedDisplacement8 })
    );
    assert_eq!(encode_line("LD HL, SP+-5"), Err(NumericError::Invalid("+-5".into())));
    assert_eq!(encode_line("LD HL, SP+0XZZ"), Err(NumericError::Invalid("+0XZZ".into())));
}
