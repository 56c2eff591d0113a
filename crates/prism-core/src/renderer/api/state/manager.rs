// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Creation, deduplication and defaults for state objects.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, OnceLock, Weak};

use super::{
    BlendState, BlendStateDesc, DepthStencilState, DepthStencilStateDesc, RasterizerState,
    RasterizerStateDesc, RenderStateObject, SamplerState, SamplerStateDesc,
};
use crate::utils::sync;

/// Per-descriptor-type storage: the lazily created default and the dedup table.
struct StateCache<D> {
    default: OnceLock<Arc<RenderStateObject<D>>>,
    shared: Mutex<HashMap<D, Weak<RenderStateObject<D>>>>,
}

impl<D: Clone + Eq + Hash + Default> StateCache<D> {
    fn new() -> Self {
        Self {
            default: OnceLock::new(),
            shared: Mutex::new(HashMap::new()),
        }
    }

    fn default_state(&self) -> Arc<RenderStateObject<D>> {
        self.default
            .get_or_init(|| Arc::new(RenderStateObject::new(D::default())))
            .clone()
    }

    fn shared_state(&self, desc: &D) -> Arc<RenderStateObject<D>> {
        let mut shared = sync::lock(&self.shared);
        if let Some(existing) = shared.get(desc).and_then(Weak::upgrade) {
            return existing;
        }
        // Drop entries whose objects are gone before inserting.
        shared.retain(|_, weak| weak.strong_count() > 0);
        let state = Arc::new(RenderStateObject::new(desc.clone()));
        shared.insert(desc.clone(), Arc::downgrade(&state));
        state
    }

    fn shared_count(&self) -> usize {
        sync::lock(&self.shared)
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

/// Hands out blend, rasterizer, depth-stencil and sampler state objects.
///
/// - `create_*` always builds a new object.
/// - `shared_*` returns the live object already built for an equal descriptor,
///   if any holder still has one, and builds it otherwise.
/// - `default_*` returns one instance per manager built from the descriptor's
///   `Default`, created on first request.
///
/// The manager is owned by the render system and dropped after the backend
/// has been destroyed, so the default instances are the last states released.
pub struct RenderStateManager {
    blend: StateCache<BlendStateDesc>,
    rasterizer: StateCache<RasterizerStateDesc>,
    depth_stencil: StateCache<DepthStencilStateDesc>,
    sampler: StateCache<SamplerStateDesc>,
}

impl RenderStateManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self {
            blend: StateCache::new(),
            rasterizer: StateCache::new(),
            depth_stencil: StateCache::new(),
            sampler: StateCache::new(),
        }
    }

    /// Creates a new blend state.
    pub fn create_blend_state(&self, desc: &BlendStateDesc) -> Arc<BlendState> {
        Arc::new(RenderStateObject::new(*desc))
    }

    /// Creates a new rasterizer state.
    pub fn create_rasterizer_state(&self, desc: &RasterizerStateDesc) -> Arc<RasterizerState> {
        Arc::new(RenderStateObject::new(*desc))
    }

    /// Creates a new depth-stencil state.
    pub fn create_depth_stencil_state(
        &self,
        desc: &DepthStencilStateDesc,
    ) -> Arc<DepthStencilState> {
        Arc::new(RenderStateObject::new(*desc))
    }

    /// Creates a new sampler state.
    pub fn create_sampler_state(&self, desc: &SamplerStateDesc) -> Arc<SamplerState> {
        Arc::new(RenderStateObject::new(*desc))
    }

    /// Returns a blend state shared by every caller using an equal descriptor.
    pub fn shared_blend_state(&self, desc: &BlendStateDesc) -> Arc<BlendState> {
        self.blend.shared_state(desc)
    }

    /// Returns a rasterizer state shared by every caller using an equal descriptor.
    pub fn shared_rasterizer_state(&self, desc: &RasterizerStateDesc) -> Arc<RasterizerState> {
        self.rasterizer.shared_state(desc)
    }

    /// Returns a depth-stencil state shared by every caller using an equal descriptor.
    pub fn shared_depth_stencil_state(
        &self,
        desc: &DepthStencilStateDesc,
    ) -> Arc<DepthStencilState> {
        self.depth_stencil.shared_state(desc)
    }

    /// Returns a sampler state shared by every caller using an equal descriptor.
    pub fn shared_sampler_state(&self, desc: &SamplerStateDesc) -> Arc<SamplerState> {
        self.sampler.shared_state(desc)
    }

    /// The default blend state.
    pub fn default_blend_state(&self) -> Arc<BlendState> {
        self.blend.default_state()
    }

    /// The default rasterizer state.
    pub fn default_rasterizer_state(&self) -> Arc<RasterizerState> {
        self.rasterizer.default_state()
    }

    /// The default depth-stencil state.
    pub fn default_depth_stencil_state(&self) -> Arc<DepthStencilState> {
        self.depth_stencil.default_state()
    }

    /// The default sampler state.
    pub fn default_sampler_state(&self) -> Arc<SamplerState> {
        self.sampler.default_state()
    }

    /// The number of live shared (deduplicated) state objects of every kind.
    pub fn shared_state_count(&self) -> usize {
        self.blend.shared_count()
            + self.rasterizer.shared_count()
            + self.depth_stencil.shared_count()
            + self.sampler.shared_count()
    }
}

impl Default for RenderStateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RenderStateManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderStateManager")
            .field("shared_states", &self.shared_state_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::LinearRgba;
    use crate::renderer::api::state::{
        BlendFactor, BlendOperation, CompareFunction, CullingMode, FilterOptions, PolygonMode,
        StencilOperation, TextureAddressingMode,
    };

    #[test]
    fn test_default_states_are_stable_instances() {
        let manager = RenderStateManager::new();
        assert!(Arc::ptr_eq(
            &manager.default_blend_state(),
            &manager.default_blend_state()
        ));
        assert!(Arc::ptr_eq(
            &manager.default_rasterizer_state(),
            &manager.default_rasterizer_state()
        ));
        assert!(Arc::ptr_eq(
            &manager.default_depth_stencil_state(),
            &manager.default_depth_stencil_state()
        ));
        assert!(Arc::ptr_eq(
            &manager.default_sampler_state(),
            &manager.default_sampler_state()
        ));
    }

    #[test]
    fn test_default_sampler_matches_documented_values() {
        let manager = RenderStateManager::new();
        let sampler = manager.default_sampler_state();
        let desc = sampler.desc();
        assert_eq!(desc.min_filter, FilterOptions::Linear);
        assert_eq!(desc.mag_filter, FilterOptions::Linear);
        assert_eq!(desc.mip_filter, FilterOptions::Point);
        assert_eq!(desc.border_color, LinearRgba::BLACK);
        assert_eq!(desc.address_mode.u, TextureAddressingMode::Wrap);
        assert_eq!(desc.comparison_func, CompareFunction::AlwaysPass);
        assert_eq!(desc.max_aniso, 0);
        assert_eq!(desc.mip_min, -f32::MAX);
        assert_eq!(desc.mip_max, f32::MAX);
    }

    #[test]
    fn test_default_blend_rasterizer_depth_values() {
        let manager = RenderStateManager::new();

        let blend = manager.default_blend_state();
        let target = blend.desc().target(0);
        assert!(!target.blend_enable);
        assert_eq!(target.src_blend, BlendFactor::One);
        assert_eq!(target.dst_blend, BlendFactor::Zero);
        assert_eq!(target.blend_op, BlendOperation::Add);
        assert_eq!(target.render_target_write_mask, 0xFF);
        assert!(!blend.desc().alpha_to_coverage_enable);

        let raster = manager.default_rasterizer_state();
        assert_eq!(raster.desc().polygon_mode, PolygonMode::Solid);
        assert_eq!(raster.desc().cull_mode, CullingMode::CounterClockwise);
        assert!(raster.desc().depth_clip_enable);
        assert!(raster.desc().multisample_enable);
        assert!(!raster.desc().scissor_enable);

        let depth = manager.default_depth_stencil_state();
        assert!(depth.desc().depth_read_enable);
        assert!(depth.desc().depth_write_enable);
        assert_eq!(depth.desc().depth_comparison_func, CompareFunction::Less);
        assert!(!depth.desc().stencil_enable);
        assert_eq!(depth.desc().front.pass_op, StencilOperation::Keep);
        assert_eq!(
            depth.desc().back.comparison_func,
            CompareFunction::AlwaysPass
        );
    }

    #[test]
    fn test_create_does_not_deduplicate_but_shared_does() {
        let manager = RenderStateManager::new();
        let desc = RasterizerStateDesc {
            cull_mode: CullingMode::None,
            ..Default::default()
        };

        let a = manager.create_rasterizer_state(&desc);
        let b = manager.create_rasterizer_state(&desc);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(a.id(), b.id());

        let c = manager.shared_rasterizer_state(&desc);
        let d = manager.shared_rasterizer_state(&desc);
        assert!(Arc::ptr_eq(&c, &d));
        assert_eq!(manager.shared_state_count(), 1);
    }

    #[test]
    fn test_shared_state_is_rebuilt_after_last_holder_drops() {
        let manager = RenderStateManager::new();
        let desc = SamplerStateDesc {
            max_aniso: 8,
            ..Default::default()
        };

        let first_id = manager.shared_sampler_state(&desc).id();
        assert_eq!(manager.shared_state_count(), 0);

        let second = manager.shared_sampler_state(&desc);
        assert_ne!(second.id(), first_id);
        assert_eq!(manager.shared_state_count(), 1);
    }

    #[test]
    fn test_float_fields_distinguish_descriptors() {
        let a = RasterizerStateDesc {
            depth_bias: 1.0,
            ..Default::default()
        };
        let b = RasterizerStateDesc::default();
        assert_ne!(a, b);
        assert_eq!(b, RasterizerStateDesc::default());
    }
}
