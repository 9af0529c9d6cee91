//! `JSContextRef.h`: context groups and execution contexts

use crate::base::*;

unsafe extern "C" {
    /// Creates a JavaScript context group. Ownership follows the Create Rule.
    pub fn JSContextGroupCreate() -> JSContextGroupRef;
    /// Retains a JavaScript context group.
    pub fn JSContextGroupRetain(group: JSContextGroupRef) -> JSContextGroupRef;
    /// Releases a JavaScript context group.
    pub fn JSContextGroupRelease(group: JSContextGroupRef);

    /// Creates a global context in a unique context group.
    ///
    /// Pass null for `global_object_class` to use the default object class.
    pub fn JSGlobalContextCreate(global_object_class: JSClassRef) -> JSGlobalContextRef;
    /// Creates a global context in `group`, which the context retains.
    ///
    /// Pass null for `group` to create a unique group for the context.
    pub fn JSGlobalContextCreateInGroup(
        group: JSContextGroupRef,
        global_object_class: JSClassRef,
    ) -> JSGlobalContextRef;
    pub fn JSGlobalContextRetain(ctx: JSGlobalContextRef) -> JSGlobalContextRef;
    pub fn JSGlobalContextRelease(ctx: JSGlobalContextRef);

    pub fn JSContextGetGlobalObject(ctx: JSContextRef) -> JSObjectRef;
    pub fn JSContextGetGroup(ctx: JSContextRef) -> JSContextGroupRef;
    pub fn JSContextGetGlobalContext(ctx: JSContextRef) -> JSGlobalContextRef;

    /// Gets a copy of the name of a context, or null if it has none.
    pub fn JSGlobalContextCopyName(ctx: JSGlobalContextRef) -> JSStringRef;
    /// Sets the name exposed when inspecting a context.
    pub fn JSGlobalContextSetName(ctx: JSGlobalContextRef, name: JSStringRef);
    pub fn JSGlobalContextIsInspectable(ctx: JSGlobalContextRef) -> bool;
    /// Sets whether the context is inspectable in Web Inspector. Defaults to false.
    pub fn JSGlobalContextSetInspectable(ctx: JSGlobalContextRef, inspectable: bool);
}
