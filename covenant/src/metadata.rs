//! Assembly of the registry's metadata document from its registered
//! namespaces.

use std::collections::BTreeMap;

use covenant_core::{ComponentMetadata, ContractMetadata, Info, RegistryMetadata, TransactionMetadata};

use crate::error::RegistrationError;
use crate::registry::ContractNamespace;

const DEFAULT_TITLE: &str = "undefined";
const DEFAULT_VERSION: &str = "latest";

/// Reflect every namespace into the full document. Transactions are
/// listed alphabetically by operation name; named composite types land
/// in the shared component table.
pub(crate) fn assemble(
    title: Option<&str>,
    version: Option<&str>,
    contracts: &BTreeMap<String, ContractNamespace>,
) -> Result<RegistryMetadata, RegistrationError> {
    let mut components = ComponentMetadata::default();
    let mut reflected = BTreeMap::new();

    for (name, namespace) in contracts {
        let mut transactions: Vec<TransactionMetadata> = Vec::new();
        for operation in namespace.operations.values() {
            transactions.push(operation.reflect(&mut components)?);
        }
        transactions.sort_by(|a, b| a.name.cmp(&b.name));

        reflected.insert(
            name.clone(),
            ContractMetadata {
                info: Info {
                    title: name.clone(),
                    version: namespace.version.clone(),
                },
                name: name.clone(),
                transactions,
            },
        );
    }

    Ok(RegistryMetadata {
        info: Info {
            title: title.unwrap_or(DEFAULT_TITLE).to_string(),
            version: version.unwrap_or(DEFAULT_VERSION).to_string(),
        },
        contracts: reflected,
        components,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operation::{CallType, Operation, OperationSpec};
    use covenant_core::{ContextDescriptor, TypeDescriptor};

    fn namespace_with(names: &[&str]) -> ContractNamespace {
        let ctx = ContextDescriptor::base();
        let mut ns = ContractNamespace::new("1.1.0", ctx.clone());
        for name in names {
            let spec = OperationSpec::new(*name, |_, _| Ok(None)).param(TypeDescriptor::String);
            let op = Operation::build(spec, CallType::Submit, &ctx).unwrap();
            ns.operations.insert((*name).to_string(), op);
        }
        ns
    }

    #[test]
    fn test_assemble_defaults_title_and_version() {
        let doc = assemble(None, None, &BTreeMap::new()).unwrap();
        assert_eq!(doc.info.title, "undefined");
        assert_eq!(doc.info.version, "latest");
        assert!(doc.contracts.is_empty());
    }

    #[test]
    fn test_assemble_orders_transactions_alphabetically() {
        let mut contracts = BTreeMap::new();
        contracts.insert(
            "asset".to_string(),
            namespace_with(&["Update", "Create", "Read"]),
        );
        let doc = assemble(Some("demo"), Some("0.0.1"), &contracts).unwrap();
        let names: Vec<&str> = doc.contracts["asset"]
            .transactions
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, ["Create", "Read", "Update"]);
        assert_eq!(doc.contracts["asset"].info.version, "1.1.0");
        assert_eq!(doc.info.title, "demo");
    }
}
