//! Arithmetic, logic and status-word behaviour driven through the pipeline.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;
use xm23_core::{
    AluOp, CoreState, GeneralRegister, Instruction, OperandSource, StatusFlag, StepOutcome,
    UnaryOp, Width, CARRY_TABLE, OVERFLOW_TABLE,
};

fn load_program(state: &mut CoreState, program: &[Instruction]) {
    let image: Vec<u8> = program
        .iter()
        .flat_map(|instruction| instruction.encode().to_le_bytes())
        .collect();
    state.load_image(0x0000, &image).expect("program fits");
}

fn alu(op: AluOp, width: Width) -> Instruction {
    Instruction::Alu {
        op,
        source: OperandSource::Register,
        width,
        src: GeneralRegister::R1,
        dst: GeneralRegister::R2,
    }
}

/// Runs `op R1, R2` once and returns the resulting `R2`.
fn run_alu(op: AluOp, width: Width, src: u16, dst: u16, carry: bool) -> (u16, CoreState) {
    let mut state = CoreState::default();
    load_program(&mut state, &[alu(op, width)]);
    state.regs.set_gpr(GeneralRegister::R1, src);
    state.regs.set_gpr(GeneralRegister::R2, dst);
    state.set_flag(StatusFlag::Carry, carry);
    let outcome = state.step();
    assert!(matches!(outcome, StepOutcome::Retired { .. }), "{outcome:?}");
    (state.regs.gpr(GeneralRegister::R2), state)
}

#[rstest]
#[case(0x0001, 0x0001, false, false)]
#[case(0x4000, 0x4000, false, true)]
#[case(0x0001, 0xFFFF, true, false)]
#[case(0x0001, 0x8000, false, false)]
#[case(0xFFFF, 0x0001, true, false)]
#[case(0x8000, 0x0001, false, false)]
#[case(0x8000, 0x8000, true, true)]
#[case(0xFFFF, 0xFFFF, true, false)]
fn add_carry_and_overflow_follow_sign_tables(
    #[case] src: u16,
    #[case] dst: u16,
    #[case] carry: bool,
    #[case] overflow: bool,
) {
    let (result, state) = run_alu(AluOp::Add, Width::Word, src, dst, false);
    assert_eq!(result, src.wrapping_add(dst));

    let (s, d, r) = (
        usize::from(src >> 15),
        usize::from(dst >> 15),
        usize::from(result >> 15),
    );
    assert_eq!(CARRY_TABLE[s][d][r], carry);
    assert_eq!(OVERFLOW_TABLE[s][d][r], overflow);
    assert_eq!(state.flag(StatusFlag::Carry), carry);
    assert_eq!(state.flag(StatusFlag::Overflow), overflow);
    assert_eq!(state.flag(StatusFlag::Zero), result == 0);
    assert_eq!(state.flag(StatusFlag::Negative), result & 0x8000 != 0);
}

#[test]
fn add_constant_one_to_largest_positive_overflows() {
    let mut state = CoreState::default();
    load_program(
        &mut state,
        &[Instruction::Alu {
            op: AluOp::Add,
            source: OperandSource::Constant,
            width: Width::Word,
            src: GeneralRegister::R1,
            dst: GeneralRegister::R0,
        }],
    );
    state.regs.set_gpr(GeneralRegister::R0, 0x7FFF);
    state.step();

    assert_eq!(state.regs.gpr(GeneralRegister::R0), 0x8000);
    assert!(state.flag(StatusFlag::Overflow));
    assert!(state.flag(StatusFlag::Negative));
    assert!(!state.flag(StatusFlag::Carry));
    assert!(!state.flag(StatusFlag::Zero));
}

#[rstest]
#[case(AluOp::Sub, 5, 5, 0, true, true)]
#[case(AluOp::Sub, 1, 0, 0xFFFF, false, false)]
#[case(AluOp::Cmp, 3, 3, 3, true, true)]
fn subtraction_uses_complement_plus_one(
    #[case] op: AluOp,
    #[case] src: u16,
    #[case] dst: u16,
    #[case] expected: u16,
    #[case] carry: bool,
    #[case] zero: bool,
) {
    let (result, state) = run_alu(op, Width::Word, src, dst, false);
    assert_eq!(result, expected);
    assert_eq!(state.flag(StatusFlag::Carry), carry);
    assert_eq!(state.flag(StatusFlag::Zero), zero);
}

#[rstest]
#[case(false, 0x000E)]
#[case(true, 0x000F)]
fn subc_borrows_through_carry(#[case] carry: bool, #[case] expected: u16) {
    let (result, _) = run_alu(AluOp::Subc, Width::Word, 0x0001, 0x0010, carry);
    assert_eq!(result, expected);
}

#[test]
fn dadd_carries_between_decimal_digits() {
    let (result, state) = run_alu(AluOp::Dadd, Width::Word, 0x0001, 0x0999, false);
    assert_eq!(result, 0x1000);
    assert!(!state.flag(StatusFlag::Carry));

    let (result, state) = run_alu(AluOp::Dadd, Width::Byte, 0x0001, 0x1299, false);
    assert_eq!(result, 0x1200);
    assert!(state.flag(StatusFlag::Carry));
}

#[test]
fn bit_tests_without_writing() {
    let (result, state) = run_alu(AluOp::Bit, Width::Word, 3, 0x0008, false);
    assert_eq!(result, 0x0008);
    assert!(!state.flag(StatusFlag::Zero));

    let (result, state) = run_alu(AluOp::Bit, Width::Word, 2, 0x0008, false);
    assert_eq!(result, 0x0008);
    assert!(state.flag(StatusFlag::Zero));
}

#[test]
fn bic_and_bis_clear_and_set_one_bit() {
    assert_eq!(run_alu(AluOp::Bic, Width::Word, 15, 0xFFFF, false).0, 0x7FFF);
    assert_eq!(run_alu(AluOp::Bis, Width::Word, 4, 0x0000, false).0, 0x0010);
}

#[rstest]
#[case(UnaryOp::Sra, Width::Word, 0x8003, 0xC001, Some(true))]
#[case(UnaryOp::Rrc, Width::Word, 0x0002, 0x8001, Some(false))]
#[case(UnaryOp::Comp, Width::Byte, 0x12F0, 0x120F, None)]
#[case(UnaryOp::Swpb, Width::Word, 0x1234, 0x3412, None)]
#[case(UnaryOp::Sxt, Width::Word, 0x0080, 0xFF80, None)]
fn unary_operations(
    #[case] op: UnaryOp,
    #[case] width: Width,
    #[case] input: u16,
    #[case] expected: u16,
    #[case] carry_out: Option<bool>,
) {
    let mut state = CoreState::default();
    load_program(
        &mut state,
        &[Instruction::Unary {
            op,
            width,
            dst: GeneralRegister::R3,
        }],
    );
    state.regs.set_gpr(GeneralRegister::R3, input);
    // RRC rotates the incoming carry into the sign bit.
    state.set_flag(StatusFlag::Carry, op == UnaryOp::Rrc);
    state.step();

    assert_eq!(state.regs.gpr(GeneralRegister::R3), expected);
    if let Some(carry) = carry_out {
        assert_eq!(state.flag(StatusFlag::Carry), carry);
    }
}

#[test]
fn mov_swap_and_immediates_leave_flags_alone() {
    let mut state = CoreState::default();
    load_program(
        &mut state,
        &[
            Instruction::Move {
                width: Width::Byte,
                src: GeneralRegister::R1,
                dst: GeneralRegister::R2,
            },
            Instruction::Swap {
                src: GeneralRegister::R1,
                dst: GeneralRegister::R2,
            },
            Instruction::MoveImmediate {
                op: xm23_core::MoveImmediateOp::Movh,
                immediate: 0xAB,
                dst: GeneralRegister::R1,
            },
        ],
    );
    state.regs.set_gpr(GeneralRegister::R1, 0xBEEF);
    state.set_flag(StatusFlag::Zero, true);

    state.step();
    assert_eq!(state.regs.gpr(GeneralRegister::R2), 0x00EF);
    state.step();
    assert_eq!(state.regs.gpr(GeneralRegister::R1), 0x00EF);
    assert_eq!(state.regs.gpr(GeneralRegister::R2), 0xBEEF);
    state.step();
    assert_eq!(state.regs.gpr(GeneralRegister::R1), 0xABEF);
    assert!(state.flag(StatusFlag::Zero));
}

proptest! {
    #[test]
    fn byte_operations_preserve_destination_high_byte(
        src in any::<u16>(),
        dst in any::<u16>(),
        op_code in 0u8..9,
    ) {
        let op = AluOp::try_from(op_code).expect("codes below 9 are defined");
        prop_assume!(op != AluOp::Cmp);
        let (result, _) = run_alu(op, Width::Byte, src, dst, false);
        prop_assert_eq!(result & 0xFF00, dst & 0xFF00);
    }

    #[test]
    fn word_add_matches_wrapping_add(src in any::<u16>(), dst in any::<u16>()) {
        let (result, state) = run_alu(AluOp::Add, Width::Word, src, dst, false);
        prop_assert_eq!(result, src.wrapping_add(dst));
        prop_assert_eq!(
            state.flag(StatusFlag::Carry),
            u32::from(src) + u32::from(dst) > 0xFFFF
        );
    }
}
