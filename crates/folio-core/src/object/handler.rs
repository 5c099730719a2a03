//! Per-type CRUD engine.

use std::sync::Arc;

use parking_lot::RwLock;
use rusqlite::Connection;
use tracing::{debug, instrument};

use crate::error::{IdentityError, Result, ValueError};
use crate::integrity::{CascadeExecutor, CascadeResult};
use crate::library::Library;
use crate::schema::{Type, TypeId};
use crate::store;

use super::array::{BlobArrayHandler, PrimitiveArrayHandler, ReferenceArrayHandler};
use super::cache::{CachePolicy, InstanceCache, SharedInstance};
use super::scalar::ScalarHandler;
use super::{Instance, InstanceId};

/// Reads and writes instances of one committed type.
///
/// Composed of one sub-handler for the instance table and one per array
/// sub-table. Every write runs in a single transaction across all of them.
/// Instances that pass through [`get`](Self::get) or the `*_shared` methods
/// are tracked by a per-handler [`InstanceCache`].
pub struct ObjectHandler<'lib> {
    library: &'lib Library,
    ty: &'lib Type,
    scalar: ScalarHandler,
    primitive_arrays: Vec<PrimitiveArrayHandler>,
    blob_arrays: Vec<BlobArrayHandler>,
    reference_arrays: Vec<ReferenceArrayHandler>,
    cache: InstanceCache,
}

impl<'lib> ObjectHandler<'lib> {
    pub(crate) fn new(library: &'lib Library, ty: &'lib Type) -> Result<Self> {
        let conn = library.connection();
        let tables = ty.tables();
        let instance_table = tables.instance().ok_or_else(|| {
            crate::SchemaError::NotInstantiable {
                name: ty.name().to_string(),
                target: ty.qualified_name(),
            }
        })?;

        let handler = Self {
            library,
            ty,
            scalar: ScalarHandler::new(conn, instance_table, tables.columns())?,
            primitive_arrays: tables
                .primitive_arrays()
                .iter()
                .map(|t| PrimitiveArrayHandler::new(conn, t))
                .collect::<Result<_>>()?,
            blob_arrays: tables
                .blob_arrays()
                .iter()
                .map(|t| BlobArrayHandler::new(conn, t))
                .collect::<Result<_>>()?,
            reference_arrays: tables
                .reference_arrays()
                .iter()
                .map(|t| ReferenceArrayHandler::new(conn, t))
                .collect::<Result<_>>()?,
            cache: InstanceCache::new(library.config().default_cache_policy),
        };
        debug!(type_name = %ty.qualified_name(), "object handler ready");
        Ok(handler)
    }

    /// The handled type.
    pub fn ty(&self) -> &'lib Type {
        self.ty
    }

    /// Id of the handled type.
    pub fn type_id(&self) -> TypeId {
        self.ty.id()
    }

    fn conn(&self) -> &'lib Connection {
        self.library.connection()
    }

    /// Create an instance with every property at its default and return its id.
    pub fn create(&mut self) -> Result<InstanceId> {
        let id = InstanceId::generate();
        let tx = store::begin(self.conn())?;
        self.scalar.create(&tx, &id)?;
        tx.commit()?;
        Ok(id)
    }

    /// Create an instance with default values and return it through the cache.
    pub fn create_instance(&mut self) -> Result<SharedInstance> {
        let id = self.create()?;
        self.get(id)
    }

    /// Insert `instance` and assign it a fresh id.
    ///
    /// Fails with [`IdentityError::AlreadyInserted`] if it already has one.
    pub fn insert(&mut self, instance: &mut Instance) -> Result<InstanceId> {
        if instance.id().is_valid() {
            return Err(IdentityError::AlreadyInserted(instance.id()).into());
        }
        self.validate(instance)?;

        let id = InstanceId::generate();
        let tx = store::begin(self.conn())?;
        self.scalar.insert(&tx, &id, instance)?;
        for handler in &self.primitive_arrays {
            handler.insert(&tx, &id, instance)?;
        }
        for handler in &self.blob_arrays {
            handler.insert(&tx, &id, instance)?;
        }
        for handler in &self.reference_arrays {
            handler.insert(&tx, &id, instance)?;
        }
        tx.commit()?;

        instance.set_id(id);
        debug!(%id, "inserted instance");
        Ok(id)
    }

    /// Insert a shared instance and cache it under the default policy.
    pub fn insert_shared(&mut self, instance: &SharedInstance) -> Result<InstanceId> {
        let id = self.insert(&mut instance.write())?;
        self.cache.admit(id, instance);
        Ok(id)
    }

    /// Replace the stored state of `instance`.
    ///
    /// Array properties are rewritten as a whole. Returns false if no
    /// instance with this id exists. A live cached copy is refreshed, or
    /// evicted when it is locked.
    pub fn update(&mut self, instance: &Instance) -> Result<bool> {
        let updated = self.write_update(instance)?;
        if updated {
            if let Some(cached) = self.cache.lookup(&instance.id()) {
                if !std::ptr::eq(cached.data_ptr(), instance) {
                    match cached.try_write() {
                        Some(mut guard) => *guard = instance.clone(),
                        // Still borrowed by the caller, so the next get rereads the store.
                        None => {
                            self.cache.clear(&instance.id());
                        }
                    }
                }
            }
        }
        Ok(updated)
    }

    /// Update a shared instance and cache it under the default policy.
    pub fn update_shared(&mut self, instance: &SharedInstance) -> Result<bool> {
        let (id, updated) = {
            let guard = instance.read();
            (guard.id(), self.write_update(&guard)?)
        };
        if updated {
            self.cache.admit(id, instance);
        }
        Ok(updated)
    }

    fn write_update(&self, instance: &Instance) -> Result<bool> {
        let id = instance.id();
        if !id.is_valid() {
            return Err(IdentityError::InvalidId.into());
        }
        self.validate(instance)?;

        let tx = store::begin(self.conn())?;
        if !self.scalar.update(&tx, instance)? {
            return Ok(false);
        }
        for handler in &self.primitive_arrays {
            handler.update(&tx, &id, instance)?;
        }
        for handler in &self.blob_arrays {
            handler.update(&tx, &id, instance)?;
        }
        for handler in &self.reference_arrays {
            handler.update(&tx, &id, instance)?;
        }
        tx.commit()?;

        debug!(%id, "updated instance");
        Ok(true)
    }

    /// Get an instance, from the cache if it holds a live copy.
    pub fn get(&mut self, id: InstanceId) -> Result<SharedInstance> {
        if !id.is_valid() {
            return Err(IdentityError::InvalidId.into());
        }
        if let Some(cached) = self.cache.lookup(&id) {
            return Ok(cached);
        }

        let mut instance = Instance::new();
        self.get_into(id, &mut instance)?;
        let shared = Arc::new(RwLock::new(instance));
        self.cache.admit(id, &shared);
        Ok(shared)
    }

    /// Read an instance from the store into `instance`, bypassing the cache.
    ///
    /// Every property path is filled: null scalars as [`Value::Null`] and
    /// arrays as [`Value::Array`]. On error `instance` is left unchanged.
    ///
    /// [`Value::Null`]: super::Value::Null
    /// [`Value::Array`]: super::Value::Array
    pub fn get_into(&self, id: InstanceId, instance: &mut Instance) -> Result<()> {
        if !id.is_valid() {
            return Err(IdentityError::InvalidId.into());
        }

        let conn = self.conn();
        let mut fetched = Instance::new();
        if !self.scalar.select_into(conn, &id, &mut fetched)? {
            return Err(IdentityError::NotFound(id).into());
        }
        for handler in &self.primitive_arrays {
            handler.select_into(conn, &id, &mut fetched)?;
        }
        for handler in &self.blob_arrays {
            handler.select_into(conn, &id, &mut fetched)?;
        }
        for handler in &self.reference_arrays {
            handler.select_into(conn, &id, &mut fetched)?;
        }
        fetched.set_id(id);
        *instance = fetched;
        Ok(())
    }

    /// Check if an instance exists. The nil id never does.
    pub fn exists(&self, id: InstanceId) -> Result<bool> {
        if !id.is_valid() {
            return Ok(false);
        }
        self.scalar.exists(self.conn(), &id)
    }

    /// Ids of all instances in insertion order.
    pub fn list(&self) -> Result<Vec<InstanceId>> {
        self.scalar.list(self.conn())
    }

    /// Delete an instance and clear every reference to it.
    ///
    /// Returns false if no instance with this id existed.
    pub fn delete(&mut self, id: InstanceId) -> Result<bool> {
        Ok(self.delete_with_cascade(id)?.0)
    }

    /// [`delete`](Self::delete), also reporting what the cascade touched.
    #[instrument(skip(self), fields(type_name = %self.ty.qualified_name()))]
    pub fn delete_with_cascade(&mut self, id: InstanceId) -> Result<(bool, CascadeResult)> {
        if !id.is_valid() {
            return Err(IdentityError::InvalidId.into());
        }

        let tx = store::begin(self.conn())?;
        for handler in &self.primitive_arrays {
            handler.delete(&tx, &id)?;
        }
        for handler in &self.blob_arrays {
            handler.delete(&tx, &id)?;
        }
        for handler in &self.reference_arrays {
            handler.delete(&tx, &id)?;
        }
        let deleted = self.scalar.delete(&tx, &id)?;
        let cascade =
            CascadeExecutor::new(self.library.registry()).process_delete(&tx, self.ty.id(), &id)?;
        tx.commit()?;

        self.cache.clear(&id);
        debug!(%id, deleted, affected = cascade.affected_count(), "deleted instance");
        Ok((deleted, cascade))
    }

    // Cache accessors.

    /// Policy applied to instances seen for the first time.
    pub fn default_cache_policy(&self) -> CachePolicy {
        self.cache.default_policy()
    }

    /// Change the policy applied to instances seen from now on.
    pub fn set_default_cache_policy(&mut self, policy: CachePolicy) {
        self.cache.set_default_policy(policy);
    }

    /// Effective cache policy of an instance.
    pub fn cache_policy(&self, id: InstanceId) -> CachePolicy {
        self.cache.policy(&id)
    }

    /// Cache a shared instance under `policy`.
    ///
    /// Fails with [`IdentityError::NotFound`] if it is not in the store.
    pub fn set_cache_policy(&mut self, instance: &SharedInstance, policy: CachePolicy) -> Result<()> {
        let id = instance.read().id();
        if !self.exists(id)? {
            return Err(IdentityError::NotFound(id).into());
        }
        self.cache.set_policy(id, instance, policy);
        Ok(())
    }

    /// Forget the cache entry of an instance.
    pub fn clear_cache(&mut self, id: InstanceId) -> bool {
        self.cache.clear(&id)
    }

    /// Stop caching weakly cached instances.
    pub fn release_weak(&mut self) {
        self.cache.release_weak();
    }

    /// Stop caching strongly cached instances.
    pub fn release_strong(&mut self) {
        self.cache.release_strong();
    }

    /// Stop caching any instance.
    pub fn release_all(&mut self) {
        self.cache.release_all();
    }

    /// Forget every cache entry.
    pub fn clear_all(&mut self) {
        self.cache.clear_all();
    }

    /// The identity cache.
    pub fn cache(&self) -> &InstanceCache {
        &self.cache
    }

    /// Reject values bound to paths the type does not declare.
    fn validate(&self, instance: &Instance) -> Result<()> {
        for path in instance.values().keys() {
            let known = self.scalar.columns().iter().any(|c| &c.path == path)
                || self.primitive_arrays.iter().any(|h| h.path() == path)
                || self.blob_arrays.iter().any(|h| h.path() == path)
                || self.reference_arrays.iter().any(|h| h.path() == path);
            if !known {
                return Err(ValueError::UnknownProperty {
                    property: path.clone(),
                }
                .into());
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ObjectHandler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectHandler")
            .field("type", &self.ty.qualified_name())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
