/// The three switches of a build invocation, read once from the command line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildFlags {
  pub watch: bool,
  pub minify: bool,
  pub disable_sourcemap: bool,
}

impl BuildFlags {
  /// Flags are presence-only, so combining two parses is a plain union.
  #[must_use]
  pub fn union(self, other: Self) -> Self {
    Self {
      watch: self.watch || other.watch,
      minify: self.minify || other.minify,
      disable_sourcemap: self.disable_sourcemap || other.disable_sourcemap,
    }
  }
}

#[test]
fn test_union_is_presence_based() {
  let watch = BuildFlags { watch: true, ..BuildFlags::default() };
  let minify = BuildFlags { minify: true, ..BuildFlags::default() };
  assert_eq!(watch.union(minify), BuildFlags { watch: true, minify: true, disable_sourcemap: false });
  assert_eq!(watch.union(watch), watch);
}
