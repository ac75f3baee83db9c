use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};

use alloy::primitives::Address;

use crate::error::{DexError, DexResult};
use crate::utils::constants::wrapped_native;

/// An ERC-20 token on a given chain
///
/// Immutable once constructed.
#[derive(Clone)]
pub struct Token {
    /// Chain the token lives on
    chain_id: u64,
    /// Contract address
    address: Address,
    /// Number of decimals the raw magnitude is scaled by
    decimals: u8,
    /// Ticker symbol
    symbol: String,
    /// Full name, when the feed knows it
    name: Option<String>,
}

/// Tokens are compared by `chain_id` and `address` only. Symbols and names come from
/// feeds that disagree with each other; the contract is the identity.
impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id == other.chain_id && self.address == other.address
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chain_id.hash(state);
        self.address.hash(state);
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({} {}@{})", self.symbol, self.address, self.chain_id)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

impl Token {
    /// Creates a new token
    #[must_use]
    pub fn new(chain_id: u64, address: Address, decimals: u8, symbol: impl Into<String>) -> Self {
        Self {
            chain_id,
            address,
            decimals,
            symbol: symbol.into(),
            name: None,
        }
    }

    /// Same token with a full name attached
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The chain id
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The contract address
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The decimal count
    #[must_use]
    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    /// The ticker symbol
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The full name, if known
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether this token sorts before `other` (V2 pairs order token0 < token1 by address)
    #[must_use]
    pub fn sorts_before(&self, other: &Self) -> bool {
        self.address < other.address
    }
}

/// Something a user can hold: the chain's gas coin or a token
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Currency {
    /// The native gas coin (MATIC, ETH)
    Native,
    /// An ERC-20 token
    Token(Token),
}

impl Currency {
    /// Whether this is the native coin
    #[must_use]
    pub const fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }

    /// The ERC-20 token that stands for this currency inside pools.
    ///
    /// # Errors
    ///
    /// `MissingDependency` when the chain has no known wrapped native token
    pub fn wrapped(&self, chain_id: u64) -> DexResult<Token> {
        match self {
            Self::Token(token) => Ok(token.clone()),
            Self::Native => wrapped_native(chain_id).ok_or(DexError::MissingDependency(
                "wrapped native token for chain",
            )),
        }
    }

    /// Symbol for display; the native coin shows as its wrapped symbol without the `W`
    #[must_use]
    pub fn symbol(&self, chain_id: u64) -> String {
        match self {
            Self::Token(token) => token.symbol().to_string(),
            Self::Native => wrapped_native(chain_id).map_or_else(
                || "ETH".to_string(),
                |w| w.symbol().trim_start_matches('W').to_string(),
            ),
        }
    }
}

impl From<Token> for Currency {
    fn from(token: Token) -> Self {
        Self::Token(token)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use alloy::primitives::address;

    use super::*;
    use crate::utils::constants::POLYGON;

    #[test]
    fn test_equality_ignores_symbol() {
        let a = Token::new(137, address!("0x831753DD7087CaC61aB5644b308642cc1c33Dc13"), 18, "QUICK");
        let b = Token::new(137, address!("0x831753DD7087CaC61aB5644b308642cc1c33Dc13"), 18, "OLDQUICK");
        let c = Token::new(1, address!("0x831753DD7087CaC61aB5644b308642cc1c33Dc13"), 18, "QUICK");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Token> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_native_wraps_to_wmatic_on_polygon() {
        let wrapped = Currency::Native.wrapped(POLYGON).unwrap();
        assert_eq!(wrapped.symbol(), "WMATIC");
        assert_eq!(Currency::Native.symbol(POLYGON), "MATIC");
    }

    #[test]
    fn test_native_on_unknown_chain_is_missing_dependency() {
        assert_eq!(
            Currency::Native.wrapped(424_242),
            Err(DexError::MissingDependency("wrapped native token for chain"))
        );
    }
}
