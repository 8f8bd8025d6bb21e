/// Field type
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldType {
    /// String, compared ordinally
    String,
    /// 64 bit floating point number. Values that fail to parse are treated as 0
    Number,
}
