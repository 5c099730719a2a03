//! The commit engine.

use tracing::{debug, info, instrument};

use crate::error::{Result, SchemaError};
use crate::library::Library;
use crate::store;

use super::plan::PhysicalPlan;
use super::{CommitOutcome, NamespaceId, Type, TypeId, TypeLayout, TypeTables};

/// Commit `layout` as type `name` of `namespace`.
///
/// All metadata rows and tables are written in one deferred transaction.
/// The in-memory registry is only updated once that transaction commits,
/// so a failure leaves both the store and the library unchanged.
#[instrument(skip(library, layout), fields(properties = layout.len()))]
pub(crate) fn commit(
    library: &mut Library,
    namespace: NamespaceId,
    name: &str,
    layout: &TypeLayout,
    instantiable: bool,
) -> Result<(CommitOutcome, TypeId)> {
    let ns = library
        .namespace_by_id(namespace)
        .ok_or_else(|| SchemaError::UnknownNamespace {
            name: namespace.to_string(),
        })?;
    let namespace_name = ns.name().to_string();

    if name.is_empty() {
        return Err(SchemaError::EmptyTypeName {
            namespace: namespace_name,
        }
        .into());
    }
    if layout.is_empty() {
        return Err(SchemaError::EmptyLayout {
            namespace: namespace_name,
            name: name.to_string(),
        }
        .into());
    }

    if let Some(existing) = ns.type_named(name) {
        if existing.layout() == layout && existing.is_instantiable() == instantiable {
            debug!(type_id = %existing.id(), "type already committed with an equal layout");
            return Ok((CommitOutcome::Existed, existing.id()));
        }
        return Err(SchemaError::IncompatibleLayout {
            namespace: namespace_name,
            name: name.to_string(),
        }
        .into());
    }

    for prop in layout.properties() {
        if let Some(target) = prop.reference_type() {
            if library.get_type(target).is_none() {
                return Err(SchemaError::UnknownType { id: target.get() }.into());
            }
        }
    }

    let plan = if instantiable {
        let instance_table = format!("{namespace_name}_{name}");
        Some(PhysicalPlan::generate(library, &instance_table, layout)?)
    } else {
        None
    };

    let tx = store::begin(library.connection())?;

    let type_id = store::insert_type(&tx, namespace.get(), name, instantiable)?;
    let mut property_ids = Vec::with_capacity(layout.len());
    for prop in layout.properties() {
        property_ids.push(store::insert_property(
            &tx,
            type_id,
            prop.name(),
            prop.data_type().as_str(),
            prop.reference_type().map(|t| t.get()),
            prop.is_array(),
            prop.is_blob(),
        )?);
    }

    let (tables, references) = match plan {
        Some(plan) => {
            for (def, kind) in &plan.definitions {
                tx.execute_batch(&def.create_sql())?;
                store::insert_generated_table(&tx, type_id, &def.name, kind.as_str())?;
                debug!(table = %def.name, kind = kind.as_str(), "created table");
            }
            (plan.tables, plan.references)
        }
        None => (TypeTables::default(), Vec::new()),
    };

    tx.commit()?;

    let ty = Type {
        id: TypeId(type_id),
        name: name.to_string(),
        namespace,
        namespace_name,
        instantiable,
        layout: layout.clone(),
        property_ids,
        tables,
    };
    info!(
        type_name = %ty.qualified_name(),
        type_id,
        tables = ty.tables().generated().count(),
        "committed type"
    );
    let id = ty.id();
    library.insert_type(ty, references);

    Ok((CommitOutcome::Created, id))
}
