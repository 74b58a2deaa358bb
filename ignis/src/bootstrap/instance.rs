use std::collections::HashSet;
use std::ffi::{c_char, CString};
use std::ptr;

use anyhow::Result;
use ash::vk;

use crate::IgnisError;

/// Quickly builds an [`Instance`](crate::core::Instance)
pub struct InstanceBuilder {
    app_name: CString,
    /// All instance level extensions used
    extensions: HashSet<CString>,
    /// All layers used
    layers: HashSet<CString>,
    /// Whether to enable validation
    validate: bool,
    /// Vulkan version used, in the form of (major, minor, patch)
    vulkan_version: (u32, u32, u32),
}

impl Default for InstanceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceBuilder {
    pub fn new() -> Self {
        Self {
            app_name: CString::default(),
            extensions: HashSet::new(),
            layers: HashSet::new(),
            validate: false,
            vulkan_version: (1, 0, 0),
        }
    }

    pub fn set_app_name(mut self, name: &str) -> Result<Self> {
        self.app_name = CString::new(name).map_err(|_| IgnisError::StringContainsNull)?;
        Ok(self)
    }

    /// Enables validation
    pub fn set_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Set vulkan version
    pub fn set_vulkan_version(mut self, version: (u32, u32, u32)) -> Self {
        self.vulkan_version = version;
        self
    }

    /// Adds an extension
    pub fn add_extension(mut self, name: *const c_char) -> Self {
        self.extensions.insert(crate::util::wrap_c_str(name));
        self
    }

    /// Adds a layer
    pub fn add_layer(mut self, name: *const c_char) -> Self {
        self.layers.insert(crate::util::wrap_c_str(name));
        self
    }

    pub fn build(mut self) -> Result<crate::core::Instance> {
        if self.validate {
            self.layers.insert(
                CString::new("VK_LAYER_KHRONOS_validation")
                    .map_err(|_| IgnisError::StringContainsNull)?,
            );
            self.extensions.insert(crate::util::wrap_c_str(
                ash::ext::debug_utils::NAME.as_ptr(),
            ));
        }

        let app_info = vk::ApplicationInfo {
            s_type: vk::StructureType::APPLICATION_INFO,
            p_next: ptr::null(),
            p_application_name: self.app_name.as_ptr(),
            application_version: 0,
            p_engine_name: self.app_name.as_ptr(),
            engine_version: 0,
            api_version: vk::make_api_version(
                0,
                self.vulkan_version.0,
                self.vulkan_version.1,
                self.vulkan_version.2,
            ),
            _marker: Default::default(),
        };

        let ext_cstrings: Vec<CString> = self.extensions.into_iter().collect();
        let ext_cptrs: Vec<*const c_char> = ext_cstrings.iter().map(|name| name.as_ptr()).collect();
        let layer_cstrings: Vec<CString> = self.layers.into_iter().collect();
        let layer_cptrs: Vec<*const c_char> =
            layer_cstrings.iter().map(|name| name.as_ptr()).collect();

        let instance_ci = vk::InstanceCreateInfo {
            s_type: vk::StructureType::INSTANCE_CREATE_INFO,
            p_next: ptr::null(),
            flags: vk::InstanceCreateFlags::empty(),
            p_application_info: &app_info,
            enabled_layer_count: layer_cptrs.len() as u32,
            pp_enabled_layer_names: layer_cptrs.as_ptr(),
            enabled_extension_count: ext_cptrs.len() as u32,
            pp_enabled_extension_names: ext_cptrs.as_ptr(),
            _marker: Default::default(),
        };

        crate::core::Instance::new(instance_ci)
    }
}
