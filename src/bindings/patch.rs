//! Repair for the include line emitted by the Swift binding generator
//!
//! The generator writes a framework-style include into the bridging header,
//! which breaks the XCFramework build where the header sits next to the
//! module map. The fix is a pure text transformation: replace the defective
//! literal when present, pass the text through unchanged otherwise, so
//! re-running the build step never double-patches the file.

/// The malformed include the generator emits
pub const DEFECTIVE_INCLUDE: &str = "#include <ddk_ffi/ddk_ffiFFI.h>";

/// The include the XCFramework layout needs
pub const CORRECT_INCLUDE: &str = "#include \"ddk_ffiFFI.h\"";

/// Repair the generated header text; idempotent
pub fn fix_generated_include(text: &str) -> String {
  if text.contains(DEFECTIVE_INCLUDE) {
    text.replace(DEFECTIVE_INCLUDE, CORRECT_INCLUDE)
  } else {
    text.to_string()
  }
}
