//! Plaintext-backed evaluation of the homomorphic operator set.
//!
//! These functions compute what the coprocessor would compute inside the
//! encryption: wrapping arithmetic at the ciphertext kind's width, bitwise
//! logic, comparisons producing booleans, and the ternary select. The host
//! performs all grant checks before calling in here; evaluation itself only
//! validates operand shapes (kind agreement, scalar divisors, supported
//! operator/kind combinations).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::handle::{CiphertextKind, Handle};

/// Second operand of a binary or comparison operation.
///
/// Mirrors the coprocessor calling convention: the left operand is always
/// an encrypted handle, the right operand is either another handle or a
/// public scalar baked into the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// An encrypted operand; requires a compute grant.
    Handle(Handle),
    /// A public scalar, masked to the left operand's width.
    Scalar(u128),
}

/// Binary operators deriving a handle of the operand kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    /// Wrapping addition.
    Add,
    /// Wrapping subtraction.
    Sub,
    /// Wrapping multiplication.
    Mul,
    /// Division; scalar divisor only.
    Div,
    /// Remainder; scalar modulus only.
    Rem,
    /// Bitwise AND.
    BitAnd,
    /// Bitwise OR.
    BitOr,
    /// Bitwise XOR.
    BitXor,
    /// Left shift; shift amount taken modulo the bit width.
    Shl,
    /// Right shift; shift amount taken modulo the bit width.
    Shr,
    /// Minimum.
    Min,
    /// Maximum.
    Max,
}

impl BinaryOp {
    /// Operator name used in error reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Rem => "rem",
            Self::BitAnd => "bitand",
            Self::BitOr => "bitor",
            Self::BitXor => "bitxor",
            Self::Shl => "shl",
            Self::Shr => "shr",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Division and remainder accept only a public divisor; the
    /// coprocessor exposes no encrypted-divisor circuit.
    #[must_use]
    pub const fn requires_scalar_rhs(self) -> bool {
        matches!(self, Self::Div | Self::Rem)
    }

    const fn supports(self, kind: CiphertextKind) -> bool {
        match self {
            Self::BitAnd | Self::BitOr | Self::BitXor => true,
            _ => kind.is_integer(),
        }
    }
}

/// Comparison operators deriving a `Bool` handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    /// Equality.
    Eq,
    /// Inequality.
    Ne,
    /// Strictly less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Strictly greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}

impl CmpOp {
    /// Operator name used in error reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
        }
    }

    const fn supports(self, kind: CiphertextKind) -> bool {
        match self {
            Self::Eq | Self::Ne => true,
            _ => kind.is_integer(),
        }
    }
}

/// Unary operators deriving a handle of the operand kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// Wrapping negation (two's complement at the kind's width).
    Neg,
    /// Bitwise complement at the kind's width.
    Not,
}

impl UnaryOp {
    /// Operator name used in error reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Neg => "neg",
            Self::Not => "not",
        }
    }
}

/// Errors raised by operand-shape validation and evaluation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The operand kinds disagree.
    #[error("ciphertext kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        /// The kind of the left operand.
        expected: CiphertextKind,
        /// The kind of the offending operand.
        actual: CiphertextKind,
    },

    /// The operator is not defined for this ciphertext kind.
    #[error("operator {op} is not supported for {kind}")]
    UnsupportedForKind {
        /// The operator name.
        op: &'static str,
        /// The offending kind.
        kind: CiphertextKind,
    },

    /// A zero scalar divisor or modulus was supplied.
    #[error("zero divisor in {op}")]
    DivisionByZero {
        /// The operator name (`div` or `rem`).
        op: &'static str,
    },

    /// An encrypted right operand was supplied to a scalar-only operator.
    #[error("operator {op} requires a public scalar divisor")]
    EncryptedDivisor {
        /// The operator name (`div` or `rem`).
        op: &'static str,
    },
}

/// Applies a binary operator to plaintexts of the given kind.
///
/// # Errors
///
/// Returns `UnsupportedForKind` for operator/kind combinations the
/// coprocessor does not expose and `DivisionByZero` for a zero scalar
/// divisor or modulus. Encrypted-divisor rejection happens before operand
/// resolution, in the host.
pub(crate) fn apply_binary(
    op: BinaryOp,
    kind: CiphertextKind,
    lhs: u128,
    rhs: u128,
) -> Result<u128, EvalError> {
    if !op.supports(kind) {
        return Err(EvalError::UnsupportedForKind { op: op.name(), kind });
    }
    let mask = kind.mask();
    let rhs = rhs & mask;
    let value = match op {
        BinaryOp::Add => lhs.wrapping_add(rhs),
        BinaryOp::Sub => lhs.wrapping_sub(rhs),
        BinaryOp::Mul => lhs.wrapping_mul(rhs),
        BinaryOp::Div => {
            if rhs == 0 {
                return Err(EvalError::DivisionByZero { op: op.name() });
            }
            lhs / rhs
        }
        BinaryOp::Rem => {
            if rhs == 0 {
                return Err(EvalError::DivisionByZero { op: op.name() });
            }
            lhs % rhs
        }
        BinaryOp::BitAnd => lhs & rhs,
        BinaryOp::BitOr => lhs | rhs,
        BinaryOp::BitXor => lhs ^ rhs,
        BinaryOp::Shl => lhs << (rhs % u128::from(kind.bit_width())),
        BinaryOp::Shr => lhs >> (rhs % u128::from(kind.bit_width())),
        BinaryOp::Min => lhs.min(rhs),
        BinaryOp::Max => lhs.max(rhs),
    };
    Ok(value & mask)
}

/// Applies a comparison operator to plaintexts of the given kind.
///
/// # Errors
///
/// Returns `UnsupportedForKind` for ordered comparisons on `Bool`.
pub(crate) fn apply_cmp(
    op: CmpOp,
    kind: CiphertextKind,
    lhs: u128,
    rhs: u128,
) -> Result<bool, EvalError> {
    if !op.supports(kind) {
        return Err(EvalError::UnsupportedForKind { op: op.name(), kind });
    }
    let rhs = rhs & kind.mask();
    Ok(match op {
        CmpOp::Eq => lhs == rhs,
        CmpOp::Ne => lhs != rhs,
        CmpOp::Lt => lhs < rhs,
        CmpOp::Le => lhs <= rhs,
        CmpOp::Gt => lhs > rhs,
        CmpOp::Ge => lhs >= rhs,
    })
}

/// Applies a unary operator to a plaintext of the given kind.
///
/// # Errors
///
/// Returns `UnsupportedForKind` for `Neg` on `Bool`.
pub(crate) fn apply_unary(op: UnaryOp, kind: CiphertextKind, value: u128) -> Result<u128, EvalError> {
    match op {
        UnaryOp::Neg => {
            if !kind.is_integer() {
                return Err(EvalError::UnsupportedForKind { op: op.name(), kind });
            }
            Ok(value.wrapping_neg() & kind.mask())
        }
        UnaryOp::Not => Ok(!value & kind.mask()),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn add_wraps_at_kind_width() {
        let max = CiphertextKind::Uint8.mask();
        assert_eq!(apply_binary(BinaryOp::Add, CiphertextKind::Uint8, max, 1), Ok(0));
        assert_eq!(apply_binary(BinaryOp::Sub, CiphertextKind::Uint8, 0, 1), Ok(max));
        assert_eq!(
            apply_binary(BinaryOp::Mul, CiphertextKind::Uint8, 16, 16),
            Ok(0)
        );
    }

    #[test]
    fn div_and_rem_reject_zero() {
        assert_eq!(
            apply_binary(BinaryOp::Div, CiphertextKind::Uint32, 10, 0),
            Err(EvalError::DivisionByZero { op: "div" })
        );
        assert_eq!(
            apply_binary(BinaryOp::Rem, CiphertextKind::Uint32, 10, 0),
            Err(EvalError::DivisionByZero { op: "rem" })
        );
        assert_eq!(apply_binary(BinaryOp::Div, CiphertextKind::Uint32, 10, 3), Ok(3));
        assert_eq!(apply_binary(BinaryOp::Rem, CiphertextKind::Uint32, 10, 3), Ok(1));
    }

    #[test]
    fn shifts_reduce_modulo_width() {
        assert_eq!(
            apply_binary(BinaryOp::Shl, CiphertextKind::Uint8, 1, 8),
            Ok(1)
        );
        assert_eq!(
            apply_binary(BinaryOp::Shl, CiphertextKind::Uint8, 1, 3),
            Ok(8)
        );
        assert_eq!(
            apply_binary(BinaryOp::Shr, CiphertextKind::Uint16, 0x8000, 15),
            Ok(1)
        );
    }

    #[test]
    fn min_and_max_pick_the_masked_operand() {
        assert_eq!(apply_binary(BinaryOp::Min, CiphertextKind::Uint32, 42, 17), Ok(17));
        assert_eq!(apply_binary(BinaryOp::Max, CiphertextKind::Uint32, 42, 17), Ok(42));
        // The right operand is masked to the kind's width before comparing.
        assert_eq!(
            apply_binary(BinaryOp::Max, CiphertextKind::Uint8, 200, 0x105),
            Ok(200)
        );
    }

    #[test]
    fn arithmetic_is_unsupported_for_bool() {
        assert_eq!(
            apply_binary(BinaryOp::Add, CiphertextKind::Bool, 1, 1),
            Err(EvalError::UnsupportedForKind {
                op: "add",
                kind: CiphertextKind::Bool,
            })
        );
        // Logic stays available on booleans.
        assert_eq!(apply_binary(BinaryOp::BitXor, CiphertextKind::Bool, 1, 1), Ok(0));
        assert_eq!(apply_unary(UnaryOp::Not, CiphertextKind::Bool, 0), Ok(1));
    }

    #[test]
    fn ordered_comparison_is_unsupported_for_bool() {
        assert_eq!(
            apply_cmp(CmpOp::Lt, CiphertextKind::Bool, 0, 1),
            Err(EvalError::UnsupportedForKind {
                op: "lt",
                kind: CiphertextKind::Bool,
            })
        );
        assert_eq!(apply_cmp(CmpOp::Eq, CiphertextKind::Bool, 1, 1), Ok(true));
    }

    #[test]
    fn neg_is_twos_complement_at_width() {
        assert_eq!(apply_unary(UnaryOp::Neg, CiphertextKind::Uint8, 1), Ok(0xFF));
        assert_eq!(apply_unary(UnaryOp::Neg, CiphertextKind::Uint8, 0), Ok(0));
        assert_eq!(
            apply_unary(UnaryOp::Neg, CiphertextKind::Bool, 1),
            Err(EvalError::UnsupportedForKind {
                op: "neg",
                kind: CiphertextKind::Bool,
            })
        );
    }

    proptest! {
        /// Wrapping semantics agree with the reference model for u64.
        #[test]
        fn u64_arithmetic_matches_reference(a in any::<u64>(), b in any::<u64>()) {
            let kind = CiphertextKind::Uint64;
            prop_assert_eq!(
                apply_binary(BinaryOp::Add, kind, a.into(), b.into()),
                Ok(u128::from(a.wrapping_add(b)))
            );
            prop_assert_eq!(
                apply_binary(BinaryOp::Sub, kind, a.into(), b.into()),
                Ok(u128::from(a.wrapping_sub(b)))
            );
            prop_assert_eq!(
                apply_binary(BinaryOp::Mul, kind, a.into(), b.into()),
                Ok(u128::from(a.wrapping_mul(b)))
            );
        }

        /// Comparisons agree with the reference model for u64.
        #[test]
        fn u64_comparisons_match_reference(a in any::<u64>(), b in any::<u64>()) {
            let kind = CiphertextKind::Uint64;
            prop_assert_eq!(apply_cmp(CmpOp::Lt, kind, a.into(), b.into()), Ok(a < b));
            prop_assert_eq!(apply_cmp(CmpOp::Ge, kind, a.into(), b.into()), Ok(a >= b));
            prop_assert_eq!(apply_cmp(CmpOp::Eq, kind, a.into(), b.into()), Ok(a == b));
        }
    }
}
