use alloy::primitives::{Address, U256};

use super::resolver::MethodCall;
use crate::approval::ApprovalState;
use crate::error::{DexError, DexResult};
use crate::liquidity::WithdrawalQuote;
use crate::models::Currency;

/// A router or token call, described by its semantic parameters.
///
/// Encoding is left to the submission collaborator; this only fixes which method
/// is called with which values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterCall {
    /// `removeLiquidity(tokenA, tokenB, liquidity, amountAMin, amountBMin, to, deadline)`
    RemoveLiquidity {
        /// First token, in the order the user picked
        token_a: Address,
        /// Second token
        token_b: Address,
        /// LP tokens to burn
        liquidity: U256,
        /// Least `token_a` accepted
        amount_a_min: U256,
        /// Least `token_b` accepted
        amount_b_min: U256,
        /// Recipient
        to: Address,
        /// Unix deadline
        deadline: U256,
    },
    /// `removeLiquidityETH(token, liquidity, amountTokenMin, amountETHMin, to, deadline)`
    RemoveLiquidityEth(NativeRemoval),
    /// Same arguments as [`RouterCall::RemoveLiquidityEth`], for tokens that tax transfers
    RemoveLiquidityEthSupportingFeeOnTransferTokens(NativeRemoval),
    /// `approve(spender, amount)` on the token contract
    Approve {
        /// Token contract
        token: Address,
        /// Who may spend
        spender: Address,
        /// How much
        amount: U256,
    },
}

/// Arguments of a removal that pays one side out as the native coin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeRemoval {
    /// The non-native token
    pub token: Address,
    /// LP tokens to burn
    pub liquidity: U256,
    /// Least `token` accepted
    pub amount_token_min: U256,
    /// Least native coin accepted
    pub amount_eth_min: U256,
    /// Recipient
    pub to: Address,
    /// Unix deadline
    pub deadline: U256,
}

impl RouterCall {
    /// Contract the call goes to: the token for `approve`, the router otherwise
    #[must_use]
    pub const fn target(&self, router: Address) -> Address {
        match self {
            Self::Approve { token, .. } => *token,
            _ => router,
        }
    }
}

impl MethodCall for RouterCall {
    fn method_name(&self) -> &str {
        match self {
            Self::RemoveLiquidity { .. } => "removeLiquidity",
            Self::RemoveLiquidityEth(_) => "removeLiquidityETH",
            Self::RemoveLiquidityEthSupportingFeeOnTransferTokens(_) => {
                "removeLiquidityETHSupportingFeeOnTransferTokens"
            }
            Self::Approve { .. } => "approve",
        }
    }

    fn args(&self) -> Vec<String> {
        let addr = |a: &Address| a.to_checksum(None);
        let hex = |v: &U256| format!("0x{v:x}");
        match self {
            Self::RemoveLiquidity {
                token_a,
                token_b,
                liquidity,
                amount_a_min,
                amount_b_min,
                to,
                deadline,
            } => vec![
                addr(token_a),
                addr(token_b),
                liquidity.to_string(),
                amount_a_min.to_string(),
                amount_b_min.to_string(),
                addr(to),
                hex(deadline),
            ],
            Self::RemoveLiquidityEth(removal) | Self::RemoveLiquidityEthSupportingFeeOnTransferTokens(removal) => {
                vec![
                    addr(&removal.token),
                    removal.liquidity.to_string(),
                    removal.amount_token_min.to_string(),
                    removal.amount_eth_min.to_string(),
                    addr(&removal.to),
                    hex(&removal.deadline),
                ]
            }
            Self::Approve { spender, amount, .. } => vec![addr(spender), amount.to_string()],
        }
    }
}

/// Context a router call cannot be built without
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    /// Chain the wallet is connected to
    pub chain_id: Option<u64>,
    /// Account receiving the tokens
    pub recipient: Option<Address>,
    /// Unix deadline for the transaction
    pub deadline: Option<U256>,
}

/// `now + ttl`, the latest block timestamp the router will accept
#[must_use]
pub fn deadline_from(now: u64, ttl_secs: u64) -> U256 {
    U256::from(now) + U256::from(ttl_secs)
}

/// Candidate calls for a withdrawal, in the order they should be tried.
///
/// With a native side there are two equivalent methods and the fee-on-transfer
/// variant only runs when the plain one fails estimation.
///
/// # Errors
///
/// * `MissingDependency` without chain id, recipient or deadline
/// * `NotApproved` unless the LP token approval is `APPROVED`
/// * `TokenMismatch` if a currency is not in the pool, or both are native
pub fn remove_liquidity_candidates(
    quote: &WithdrawalQuote,
    approval: ApprovalState,
    currency_a: &Currency,
    currency_b: &Currency,
    context: &CallContext,
) -> DexResult<Vec<RouterCall>> {
    let chain_id = context.chain_id.ok_or(DexError::MissingDependency("chain id"))?;
    let to = context.recipient.ok_or(DexError::MissingDependency("recipient"))?;
    let deadline = context.deadline.ok_or(DexError::MissingDependency("deadline"))?;

    if approval != ApprovalState::Approved {
        return Err(DexError::NotApproved {
            symbol: quote.liquidity.token().symbol().to_string(),
        });
    }

    let liquidity = quote.liquidity.raw();
    let token_a = currency_a.wrapped(chain_id)?;
    let token_b = currency_b.wrapped(chain_id)?;
    let amount_a_min = quote.minimum_of(&token_a)?.raw();
    let amount_b_min = quote.minimum_of(&token_b)?.raw();

    let native_removal = |token: Address, amount_token_min: U256, amount_eth_min: U256| NativeRemoval {
        token,
        liquidity,
        amount_token_min,
        amount_eth_min,
        to,
        deadline,
    };

    let calls = match (currency_a.is_native(), currency_b.is_native()) {
        (false, false) => vec![RouterCall::RemoveLiquidity {
            token_a: token_a.address(),
            token_b: token_b.address(),
            liquidity,
            amount_a_min,
            amount_b_min,
            to,
            deadline,
        }],
        (true, false) => {
            let removal = native_removal(token_b.address(), amount_b_min, amount_a_min);
            vec![
                RouterCall::RemoveLiquidityEth(removal.clone()),
                RouterCall::RemoveLiquidityEthSupportingFeeOnTransferTokens(removal),
            ]
        }
        (false, true) => {
            let removal = native_removal(token_a.address(), amount_a_min, amount_b_min);
            vec![
                RouterCall::RemoveLiquidityEth(removal.clone()),
                RouterCall::RemoveLiquidityEthSupportingFeeOnTransferTokens(removal),
            ]
        }
        (true, true) => {
            return Err(DexError::TokenMismatch {
                left: currency_a.symbol(chain_id),
                right: currency_b.symbol(chain_id),
            })
        }
    };
    Ok(calls)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::liquidity::{WithdrawInput, WithdrawalCalculator};
    use crate::math::Percent;
    use crate::models::PoolSnapshot;
    use crate::test_helpers::{address_from_str, amount, token};
    use crate::utils::constants::{wrapped_native, POLYGON};

    fn matic_usdc_quote() -> WithdrawalQuote {
        let pool = PoolSnapshot::new(
            token("WMATIC-USDC-LP", 18),
            wrapped_native(POLYGON).unwrap(),
            token("USDC", 6),
            U256::from(10_000_000_000_000_000_000_u128),
            U256::from(20_000_000),
            U256::from(1_000),
        )
        .unwrap();
        let balance = amount(pool.liquidity_token(), 1_000);
        WithdrawalCalculator::default()
            .quote(&pool, &balance, &WithdrawInput::Percent(Percent::from_whole(50)))
            .unwrap()
    }

    fn context() -> CallContext {
        CallContext {
            chain_id: Some(POLYGON),
            recipient: Some(address_from_str("alice")),
            deadline: Some(deadline_from(1_700_000_000, 1_200)),
        }
    }

    #[test]
    fn test_native_side_yields_two_candidates() {
        let quote = matic_usdc_quote();
        let usdc = Currency::Token(token("USDC", 6));
        let calls =
            remove_liquidity_candidates(&quote, ApprovalState::Approved, &usdc, &Currency::Native, &context())
                .unwrap();

        let names: Vec<&str> = calls.iter().map(MethodCall::method_name).collect();
        assert_eq!(
            names,
            ["removeLiquidityETH", "removeLiquidityETHSupportingFeeOnTransferTokens"]
        );
        let args = calls[0].args();
        assert_eq!(args[0], token("USDC", 6).address().to_checksum(None));
        assert_eq!(args[1], "500");
        // 10 USDC less 0.5%, 5 MATIC less 0.5%
        assert_eq!(args[2], "9950000");
        assert_eq!(args[3], "4975000000000000000");
        assert_eq!(args[5], "0x6553f5b0");
    }

    #[test]
    fn test_token_pair_uses_plain_removal() {
        let quote = matic_usdc_quote();
        let wmatic = Currency::Token(wrapped_native(POLYGON).unwrap());
        let usdc = Currency::Token(token("USDC", 6));
        let calls = remove_liquidity_candidates(&quote, ApprovalState::Approved, &wmatic, &usdc, &context()).unwrap();

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method_name(), "removeLiquidity");
        assert_eq!(calls[0].args()[3], "4975000000000000000");
        assert_eq!(calls[0].args()[4], "9950000");
    }

    #[test]
    fn test_requires_approval_and_context() {
        let quote = matic_usdc_quote();
        let usdc = Currency::Token(token("USDC", 6));

        let err = remove_liquidity_candidates(&quote, ApprovalState::Pending, &usdc, &Currency::Native, &context())
            .unwrap_err();
        assert!(matches!(err, DexError::NotApproved { .. }));

        let err = remove_liquidity_candidates(
            &quote,
            ApprovalState::Approved,
            &usdc,
            &Currency::Native,
            &CallContext {
                deadline: None,
                ..context()
            },
        )
        .unwrap_err();
        assert_eq!(err, DexError::MissingDependency("deadline"));
    }

    #[test]
    fn test_approve_targets_token_contract() {
        let call = RouterCall::Approve {
            token: address_from_str("LP"),
            spender: address_from_str("router"),
            amount: U256::MAX,
        };
        assert_eq!(call.target(address_from_str("router")), address_from_str("LP"));
        assert_eq!(call.args()[1], U256::MAX.to_string());
    }
}
