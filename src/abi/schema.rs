//! Versioned message catalog of the Spectre PSE contract.
//!
//! One schema type describes every released revision. A client bound to a
//! version consults its catalog before encoding anything, so a message that
//! does not exist in that revision never reaches the node.

use crate::domain::{AppError, ContractError, ContractVersion};

use super::selector::Selector;

/// SCALE shape of a message or constructor argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    /// UTF-8 `String`
    Text,
    /// `Vec<u8>`
    Bytes,
    /// `Network` enum
    Network,
}

/// Success payload inside `Result<_, ContractError>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningPayload {
    Bytes,
    TradingAccounts,
    TradingPublicKeys,
}

/// What a message returns inside the `LangError` layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    Unit,
    Bool,
    Bytes,
    /// `Result<payload, ContractError>`
    Signing(SigningPayload),
    /// Returned to callers undecoded
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub ty: ArgType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSpec {
    pub label: &'static str,
    /// Takes `&mut self` on chain; can be submitted as a transaction
    pub mutates: bool,
    pub args: &'static [ArgSpec],
    pub returns: ReturnShape,
}

impl MessageSpec {
    pub fn selector(&self) -> Selector {
        Selector::from_label(self.label)
    }

    /// True when the argument list has exactly the given types.
    pub fn accepts(&self, args: &[ArgType]) -> bool {
        self.args.len() == args.len() && self.args.iter().zip(args).all(|(a, b)| a.ty == *b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructorSpec {
    pub label: &'static str,
    pub args: &'static [ArgSpec],
}

impl ConstructorSpec {
    pub fn selector(&self) -> Selector {
        Selector::from_label(self.label)
    }

    pub fn accepts(&self, args: &[ArgType]) -> bool {
        self.args.len() == args.len() && self.args.iter().zip(args).all(|(a, b)| a.ty == *b)
    }
}

/// ABI of one contract revision.
#[derive(Debug, PartialEq, Eq)]
pub struct ContractSchema {
    pub version: ContractVersion,
    pub constructors: &'static [ConstructorSpec],
    pub messages: &'static [MessageSpec],
    /// Domain error variants the revision can return
    pub errors: &'static [ContractError],
}

impl ContractSchema {
    pub fn for_version(version: ContractVersion) -> &'static ContractSchema {
        match version {
            ContractVersion::V1 => &V1,
            ContractVersion::V2 => &V2,
            ContractVersion::V3 => &V3,
        }
    }

    pub fn message(&self, label: &str) -> Option<&'static MessageSpec> {
        self.messages.iter().find(|m| m.label == label)
    }

    pub fn message_by_selector(&self, selector: Selector) -> Option<&'static MessageSpec> {
        self.messages.iter().find(|m| m.selector() == selector)
    }

    pub fn constructor(&self, label: &str) -> Option<&'static ConstructorSpec> {
        self.constructors.iter().find(|c| c.label == label)
    }

    pub fn constructor_by_selector(&self, selector: Selector) -> Option<&'static ConstructorSpec> {
        self.constructors.iter().find(|c| c.selector() == selector)
    }

    /// Look up `label` and check it takes exactly `args`.
    pub fn require_message(
        &self,
        label: &str,
        args: &[ArgType],
    ) -> Result<&'static MessageSpec, AppError> {
        self.message(label)
            .filter(|spec| spec.accepts(args))
            .ok_or_else(|| self.unsupported(label))
    }

    pub fn require_constructor(
        &self,
        label: &str,
        args: &[ArgType],
    ) -> Result<&'static ConstructorSpec, AppError> {
        self.constructor(label)
            .filter(|spec| spec.accepts(args))
            .ok_or_else(|| self.unsupported(label))
    }

    pub fn declares_error(&self, error: ContractError) -> bool {
        self.errors.contains(&error)
    }

    fn unsupported(&self, label: &str) -> AppError {
        AppError::UnsupportedMessage {
            label: label.to_string(),
            version: self.version,
        }
    }
}

const NO_ARGS: &[ArgSpec] = &[];

const NETWORK_AND_MESSAGE: &[ArgSpec] = &[
    ArgSpec {
        name: "network",
        ty: ArgType::Network,
    },
    ArgSpec {
        name: "message",
        ty: ArgType::Bytes,
    },
];

const BYTES_MESSAGE: &[ArgSpec] = &[ArgSpec {
    name: "message",
    ty: ArgType::Bytes,
}];

const TEST: MessageSpec = MessageSpec {
    label: "test",
    mutates: false,
    args: NO_ARGS,
    returns: ReturnShape::Unit,
};

static V1: ContractSchema = ContractSchema {
    version: ContractVersion::V1,
    constructors: &[ConstructorSpec {
        label: "default",
        args: NO_ARGS,
    }],
    messages: &[
        MessageSpec {
            label: "sign",
            mutates: false,
            args: &[ArgSpec {
                name: "message",
                ty: ArgType::Text,
            }],
            returns: ReturnShape::Bytes,
        },
        MessageSpec {
            label: "verify",
            mutates: false,
            args: &[
                ArgSpec {
                    name: "message",
                    ty: ArgType::Text,
                },
                ArgSpec {
                    name: "signature",
                    ty: ArgType::Bytes,
                },
            ],
            returns: ReturnShape::Bool,
        },
        TEST,
    ],
    errors: &[],
};

static V2: ContractSchema = ContractSchema {
    version: ContractVersion::V2,
    constructors: &[ConstructorSpec {
        label: "default",
        args: NO_ARGS,
    }],
    messages: &[
        MessageSpec {
            label: "generate_onchain_trader_keys",
            mutates: true,
            args: NO_ARGS,
            returns: ReturnShape::Raw,
        },
        MessageSpec {
            label: "sign",
            mutates: false,
            args: NETWORK_AND_MESSAGE,
            returns: ReturnShape::Signing(SigningPayload::Bytes),
        },
        MessageSpec {
            label: "get_public_keys",
            mutates: false,
            args: NO_ARGS,
            returns: ReturnShape::Signing(SigningPayload::TradingAccounts),
        },
        TEST,
    ],
    errors: &[
        ContractError::UnregisteredTraderAccount,
        ContractError::PrivateKeyOfThatNetworkAlreadyRegistered,
        ContractError::KeysUnavailable,
    ],
};

static V3: ContractSchema = ContractSchema {
    version: ContractVersion::V3,
    constructors: &[ConstructorSpec {
        label: "seeding",
        args: &[ArgSpec {
            name: "key",
            ty: ArgType::Bytes,
        }],
    }],
    messages: &[
        MessageSpec {
            label: "generate_onchain_trading_account",
            mutates: true,
            args: NO_ARGS,
            returns: ReturnShape::Raw,
        },
        MessageSpec {
            label: "sign",
            mutates: false,
            args: NETWORK_AND_MESSAGE,
            returns: ReturnShape::Signing(SigningPayload::Bytes),
        },
        MessageSpec {
            label: "register_trading_account_to_spectre",
            mutates: false,
            args: BYTES_MESSAGE,
            returns: ReturnShape::Signing(SigningPayload::Bytes),
        },
        MessageSpec {
            label: "get_public_keys",
            mutates: false,
            args: NO_ARGS,
            returns: ReturnShape::Signing(SigningPayload::TradingPublicKeys),
        },
    ],
    errors: &[
        ContractError::UnregisteredTraderAccount,
        ContractError::PrivateKeyOfThatNetworkAlreadyRegistered,
        ContractError::KeysUnavailable,
        ContractError::FailedToConvertPubKey,
    ],
};
