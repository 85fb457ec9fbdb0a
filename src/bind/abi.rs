use alloy::dyn_abi::{DynSolType, DynSolValue, EventExt, FunctionExt, JsonAbiExt, Specifier};
use alloy::json_abi::{Event, Function, JsonAbi};
use alloy::primitives::{keccak256, Bytes, B256, U256};
use anyhow::anyhow;
use serde_json::Value;
use std::path::Path;
use tokio::fs;
use tracing::debug;

use super::error::{BindError, Result};
use super::{EventField, LogEvent, RawLog};

/// Immutable pair of a contract's ABI and its deployment bytecode.
///
/// Built once and shared read-only (behind an `Arc`) by every bound instance.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    abi: JsonAbi,
    bytecode: Bytes,
}

impl ContractDescriptor {
    pub fn new(abi: JsonAbi, bytecode: Bytes) -> Self {
        Self { abi, bytecode }
    }

    /// Builds a descriptor from a JSON ABI string and hex encoded bytecode.
    ///
    /// The bytecode may be empty for contracts that are only ever bound, never deployed.
    pub fn from_json(abi_json: &str, bytecode_hex: &str) -> Result<Self> {
        let abi: JsonAbi = serde_json::from_str(abi_json)
            .map_err(|e| BindError::Decoding(format!("invalid ABI JSON: {}", e)))?;

        let bytecode_hex = bytecode_hex.trim();
        let bytecode = hex::decode(bytecode_hex.trim_start_matches("0x"))
            .map_err(|e| BindError::Decoding(format!("invalid bytecode hex: {}", e)))?;

        Ok(Self::new(abi, bytecode.into()))
    }

    /// Loads a compiler artifact (`{"abi": [...], "bytecode": "0x..."}`) from disk.
    ///
    /// Hardhat/Truffle artifacts store the bytecode as a string; Foundry stores
    /// it as `{"object": "0x..."}`. Both are accepted.
    pub async fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read artifact {:?}: {}", path, e))?;

        let artifact: Value = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse artifact {:?}: {}", path, e))?;

        let abi = artifact
            .get("abi")
            .ok_or_else(|| anyhow!("Artifact {:?} has no 'abi' field", path))?;
        let abi: JsonAbi = serde_json::from_value(abi.clone())
            .map_err(|e| anyhow!("Failed to parse ABI in {:?}: {}", path, e))?;

        let bytecode = match artifact.get("bytecode") {
            Some(Value::String(s)) => s.as_str(),
            Some(Value::Object(obj)) => obj.get("object").and_then(Value::as_str).unwrap_or(""),
            _ => "",
        };
        let bytecode = hex::decode(bytecode.trim_start_matches("0x"))
            .map_err(|e| anyhow!("Invalid bytecode in {:?}: {}", path, e))?;

        debug!(
            "Loaded artifact {:?}: {} functions, {} events, {} bytes of bytecode",
            path,
            abi.functions().count(),
            abi.events().count(),
            bytecode.len()
        );

        Ok(Self::new(abi, bytecode.into()))
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    pub fn bytecode(&self) -> &Bytes {
        &self.bytecode
    }

    /// Resolves a method by name or full signature (`"transfer(address,uint256)"`)
    /// and, among overloads, by the supplied arguments.
    pub fn function(&self, method: &str, args: &[DynSolValue]) -> Result<&Function> {
        let candidates = self.candidates(method).ok_or_else(|| self.unknown_function(method))?;

        candidates
            .iter()
            .copied()
            .find(|f| inputs_match(f, args))
            .ok_or_else(|| {
                let expected: Vec<String> = candidates.iter().map(|f| f.signature()).collect();
                BindError::Encoding(format!(
                    "arguments do not match '{}': got {} argument(s), expected one of [{}]",
                    method,
                    args.len(),
                    expected.join(", ")
                ))
            })
    }

    /// Resolves a method for output decoding. Overloaded names must be given
    /// as a full signature.
    pub fn function_by_name(&self, method: &str) -> Result<&Function> {
        let candidates = self.candidates(method).ok_or_else(|| self.unknown_function(method))?;
        match candidates.as_slice() {
            [single] => Ok(*single),
            _ => Err(BindError::Decoding(format!(
                "method '{}' is overloaded, use its full signature",
                method
            ))),
        }
    }

    fn candidates(&self, method: &str) -> Option<Vec<&Function>> {
        let found: Vec<&Function> = if method.contains('(') {
            self.abi
                .functions()
                .filter(|f| f.signature() == method)
                .collect()
        } else {
            self.abi.function(method)?.iter().collect()
        };
        (!found.is_empty()).then_some(found)
    }

    fn unknown_function(&self, method: &str) -> BindError {
        let available: Vec<String> = self.abi.functions().map(|f| f.name.clone()).collect();
        if available.is_empty() {
            BindError::Encoding(format!(
                "method '{}' not found, the ABI contains no functions",
                method
            ))
        } else {
            BindError::Encoding(format!(
                "method '{}' not found, available methods: {}",
                method,
                available.join(", ")
            ))
        }
    }

    /// Packs the 4-byte selector followed by the ABI encoded arguments.
    pub fn encode_call(&self, method: &str, args: &[DynSolValue]) -> Result<Bytes> {
        let function = self.function(method, args)?;
        let encoded = function
            .abi_encode_input(args)
            .map_err(|e| BindError::Encoding(format!("{}: {}", function.signature(), e)))?;
        Ok(encoded.into())
    }

    /// Unpacks return data according to the method's declared outputs.
    pub fn decode_output(&self, method: &str, data: &[u8]) -> Result<Vec<DynSolValue>> {
        let function = self.function_by_name(method)?;
        if function.outputs.is_empty() {
            return Ok(Vec::new());
        }

        function.abi_decode_output(data, true).map_err(|e| {
            BindError::Decoding(format!(
                "{} returned {} byte(s): {}",
                function.signature(),
                data.len(),
                e
            ))
        })
    }

    /// Deployment bytecode followed by the encoded constructor arguments.
    pub fn encode_constructor(&self, args: &[DynSolValue]) -> Result<Bytes> {
        if self.bytecode.is_empty() {
            return Err(BindError::Encoding(
                "descriptor has no deployment bytecode".to_string(),
            ));
        }

        let mut input = self.bytecode.to_vec();
        match self.abi.constructor() {
            Some(constructor) => {
                if constructor.inputs.len() != args.len() {
                    return Err(BindError::Encoding(format!(
                        "constructor expects {} argument(s), got {}",
                        constructor.inputs.len(),
                        args.len()
                    )));
                }
                if let Some(arg) = args.iter().find(|arg| !value_in_range(arg)) {
                    return Err(BindError::Encoding(format!(
                        "constructor argument {:?} is out of range for its type",
                        arg
                    )));
                }
                let encoded = constructor
                    .abi_encode_input(args)
                    .map_err(|e| BindError::Encoding(format!("constructor: {}", e)))?;
                input.extend_from_slice(&encoded);
            }
            None if !args.is_empty() => {
                return Err(BindError::Encoding(format!(
                    "contract has no constructor but {} argument(s) were given",
                    args.len()
                )));
            }
            None => {}
        }

        Ok(input.into())
    }

    /// Resolves an event by name or full signature (`"Transfer(address,address,uint256)"`).
    /// A bare name picks the first overload.
    pub fn event(&self, name: &str) -> Result<&Event> {
        self.events_named(name)
            .into_iter()
            .next()
            .ok_or_else(|| BindError::Decoding(format!("event '{}' not found in ABI", name)))
    }

    fn events_named(&self, name: &str) -> Vec<&Event> {
        if name.contains('(') {
            self.abi.events().filter(|e| e.signature() == name).collect()
        } else {
            self.abi
                .event(name)
                .map(|events| events.iter().collect())
                .unwrap_or_default()
        }
    }

    /// Finds the non-anonymous event whose selector is `topic`.
    pub fn event_by_topic(&self, topic: &B256) -> Option<&Event> {
        self.abi
            .events()
            .find(|event| !event.anonymous && event.selector() == *topic)
    }

    /// Decodes a raw log as the named event. Among overloads, the one whose
    /// selector is the log's first topic is used.
    ///
    /// Fails if the first topic is not the event's selector or if the topics
    /// or data cannot be unpacked against the event's inputs.
    pub fn decode_event(&self, name: &str, log: &RawLog) -> Result<LogEvent> {
        let candidates = self.events_named(name);
        let event = candidates
            .iter()
            .find(|e| !e.anonymous && log.topics.first() == Some(&e.selector()))
            .or(candidates.first())
            .ok_or_else(|| BindError::Decoding(format!("event '{}' not found in ABI", name)))?;
        decode_with(event, log)
    }

    /// Decodes a raw log as whichever event its first topic identifies.
    pub fn decode_any_event(&self, log: &RawLog) -> Result<LogEvent> {
        let topic = log
            .topics
            .first()
            .ok_or_else(|| BindError::Decoding("log has no topics".to_string()))?;
        let event = self
            .event_by_topic(topic)
            .ok_or_else(|| BindError::Decoding(format!("unknown event topic {}", topic)))?;
        decode_with(event, log)
    }

    /// Builds the topic filter for an event.
    ///
    /// `filters[i]` restricts the i-th *indexed* argument to any of the given
    /// values; `None` leaves it unrestricted.
    pub fn event_topics(
        &self,
        name: &str,
        filters: &[Option<Vec<DynSolValue>>],
    ) -> Result<Vec<Option<Vec<B256>>>> {
        let event = self.event(name).map_err(|e| BindError::Encoding(e.to_string()))?;
        let indexed: Vec<_> = event.inputs.iter().filter(|input| input.indexed).collect();

        if filters.len() > indexed.len() {
            return Err(BindError::Encoding(format!(
                "event {} has {} indexed argument(s), got {} filter(s)",
                event.signature(),
                indexed.len(),
                filters.len()
            )));
        }

        let mut topics = Vec::with_capacity(filters.len() + 1);
        if !event.anonymous {
            topics.push(Some(vec![event.selector()]));
        }

        for (input, filter) in indexed.iter().zip(filters) {
            let Some(values) = filter else {
                topics.push(None);
                continue;
            };
            let ty = input
                .resolve()
                .map_err(|e| BindError::Encoding(format!("'{}': {}", input.name, e)))?;
            let words = values
                .iter()
                .map(|value| topic_word(&ty, value))
                .collect::<Result<Vec<_>>>()?;
            topics.push(Some(words));
        }

        while matches!(topics.last(), Some(None)) {
            topics.pop();
        }

        Ok(topics)
    }
}

fn decode_with(event: &Event, log: &RawLog) -> Result<LogEvent> {
    if !event.anonymous {
        match log.topics.first() {
            Some(topic) if *topic == event.selector() => {}
            Some(topic) => {
                return Err(BindError::Decoding(format!(
                    "log topic {} does not match event {}",
                    topic,
                    event.signature()
                )))
            }
            None => {
                return Err(BindError::Decoding(format!(
                    "log has no topics, expected event {}",
                    event.signature()
                )))
            }
        }
    }

    let decoded = event
        .decode_log_parts(log.topics.iter().copied(), &log.data, true)
        .map_err(|e| BindError::Decoding(format!("{}: {}", event.signature(), e)))?;

    let mut indexed = decoded.indexed.into_iter();
    let mut body = decoded.body.into_iter();
    let mut fields = Vec::with_capacity(event.inputs.len());
    for input in &event.inputs {
        let value = if input.indexed {
            indexed.next()
        } else {
            body.next()
        };
        let value = value.ok_or_else(|| {
            BindError::Decoding(format!(
                "{}: missing value for '{}'",
                event.signature(),
                input.name
            ))
        })?;
        fields.push(EventField {
            name: input.name.clone(),
            value,
            indexed: input.indexed,
        });
    }

    Ok(LogEvent {
        name: event.name.clone(),
        fields,
        raw: log.clone(),
    })
}

fn inputs_match(function: &Function, args: &[DynSolValue]) -> bool {
    function.inputs.len() == args.len()
        && function.inputs.iter().zip(args).all(|(param, arg)| {
            param
                .resolve()
                .map(|ty| ty.matches(arg) && value_in_range(arg))
                .unwrap_or(false)
        })
}

/// Checks that every integer inside `value` fits its declared bit width.
pub(crate) fn value_in_range(value: &DynSolValue) -> bool {
    match value {
        DynSolValue::Uint(v, bits) => *bits >= 256 || *v < (U256::from(1) << *bits),
        DynSolValue::Int(v, bits) => {
            if *bits >= 256 {
                return true;
            }
            let limit = U256::from(1) << (*bits - 1);
            if v.is_negative() {
                // !raw == -v - 1 for negative two's complement values
                !v.into_raw() < limit
            } else {
                v.into_raw() < limit
            }
        }
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            items.iter().all(value_in_range)
        }
        _ => true,
    }
}

/// Encodes one indexed value as the topic the node stores for it.
fn topic_word(ty: &DynSolType, value: &DynSolValue) -> Result<B256> {
    if !ty.matches(value) || !value_in_range(value) {
        return Err(BindError::Encoding(format!(
            "topic value {:?} does not match type {}",
            value,
            ty.sol_type_name()
        )));
    }

    match ty {
        DynSolType::String | DynSolType::Bytes => Ok(keccak256(value.abi_encode_packed())),
        DynSolType::Array(_) | DynSolType::FixedArray(..) | DynSolType::Tuple(_) => {
            Err(BindError::Encoding(format!(
                "unsupported indexed type {}",
                ty.sol_type_name()
            )))
        }
        _ => value.as_word().ok_or_else(|| {
            BindError::Encoding(format!("cannot encode {} as a topic", ty.sol_type_name()))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, Address, U256};
    use tempfile::tempdir;

    const TOKEN_ABI: &str = r#"[
        {"type":"function","name":"balanceOf","stateMutability":"view",
         "inputs":[{"name":"owner","type":"address"}],
         "outputs":[{"name":"","type":"uint256"}]},
        {"type":"function","name":"transfer","stateMutability":"nonpayable",
         "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
         "outputs":[{"name":"","type":"bool"}]},
        {"type":"function","name":"mint","stateMutability":"nonpayable",
         "inputs":[{"name":"amount","type":"uint256"}],"outputs":[]},
        {"type":"function","name":"mint","stateMutability":"nonpayable",
         "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[]},
        {"type":"event","name":"Transfer","anonymous":false,
         "inputs":[{"name":"from","type":"address","indexed":true},
                   {"name":"to","type":"address","indexed":true},
                   {"name":"value","type":"uint256","indexed":false}]},
        {"type":"event","name":"Memo","anonymous":false,
         "inputs":[{"name":"tag","type":"string","indexed":true},
                   {"name":"text","type":"string","indexed":false}]}
    ]"#;

    fn descriptor() -> ContractDescriptor {
        ContractDescriptor::from_json(TOKEN_ABI, "0x6080").unwrap()
    }

    fn word(addr: Address) -> B256 {
        addr.into_word()
    }

    #[test]
    fn test_encode_call_prefixes_selector() {
        let d = descriptor();
        let to = address!("1234567890123456789012345678901234567890");
        let data = d
            .encode_call(
                "transfer",
                &[DynSolValue::Address(to), DynSolValue::Uint(U256::from(1000), 256)],
            )
            .unwrap();

        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data.len(), 4 + 32 + 32);
    }

    #[test]
    fn test_encode_call_rejects_bad_arguments() {
        let d = descriptor();
        let err = d
            .encode_call("transfer", &[DynSolValue::Bool(true)])
            .unwrap_err();
        assert!(matches!(err, BindError::Encoding(_)));

        let err = d.encode_call("nope", &[]).unwrap_err();
        assert!(err.to_string().contains("available methods"));
    }

    #[test]
    fn test_integers_must_fit_their_width() {
        let d = ContractDescriptor::from_json(
            r#"[{"type":"function","name":"small","stateMutability":"nonpayable",
                 "inputs":[{"name":"a","type":"uint8"},{"name":"b","type":"int8"}],"outputs":[]}]"#,
            "",
        )
        .unwrap();
        let int8 = |v: i64| DynSolValue::Int(alloy::primitives::I256::try_from(v).unwrap(), 8);

        assert!(d
            .encode_call("small", &[DynSolValue::Uint(U256::from(255), 8), int8(-128)])
            .is_ok());
        assert!(d
            .encode_call("small", &[DynSolValue::Uint(U256::from(0), 8), int8(127)])
            .is_ok());

        let err = d
            .encode_call("small", &[DynSolValue::Uint(U256::from(300), 8), int8(0)])
            .unwrap_err();
        assert!(matches!(err, BindError::Encoding(_)));
        assert!(d
            .encode_call("small", &[DynSolValue::Uint(U256::from(1), 8), int8(128)])
            .is_err());
        assert!(d
            .encode_call("small", &[DynSolValue::Uint(U256::from(1), 8), int8(-129)])
            .is_err());

        assert!(value_in_range(&DynSolValue::Array(vec![DynSolValue::Uint(U256::MAX, 256)])));
        assert!(!value_in_range(&DynSolValue::Tuple(vec![DynSolValue::Uint(
            U256::from(1) << 16,
            16
        )])));
    }

    #[test]
    fn test_overloads_resolve_by_arguments() {
        let d = descriptor();
        let one = d
            .encode_call("mint", &[DynSolValue::Uint(U256::from(1), 256)])
            .unwrap();
        let two = d
            .encode_call(
                "mint",
                &[DynSolValue::Address(Address::ZERO), DynSolValue::Uint(U256::from(1), 256)],
            )
            .unwrap();

        assert_ne!(&one[..4], &two[..4]);
        assert!(d.function_by_name("mint").is_err());
        assert!(d.function_by_name("mint(uint256)").is_ok());
    }

    #[test]
    fn test_decode_output() {
        let d = descriptor();
        let mut data = [0u8; 32];
        data[31] = 100;

        let values = d.decode_output("balanceOf", &data).unwrap();
        assert_eq!(values, vec![DynSolValue::Uint(U256::from(100), 256)]);

        let err = d.decode_output("balanceOf", &data[..16]).unwrap_err();
        assert!(matches!(err, BindError::Decoding(_)));
    }

    #[test]
    fn test_encode_constructor_appends_to_bytecode() {
        let d = descriptor();
        // no constructor in the ABI
        assert_eq!(d.encode_constructor(&[]).unwrap().as_ref(), &[0x60, 0x80]);
        assert!(d.encode_constructor(&[DynSolValue::Bool(true)]).is_err());

        let empty = ContractDescriptor::from_json(TOKEN_ABI, "").unwrap();
        assert!(empty.encode_constructor(&[]).is_err());
    }

    fn transfer_log(from: Address, to: Address, value: u64) -> RawLog {
        let d = descriptor();
        RawLog {
            topics: vec![d.event("Transfer").unwrap().selector(), word(from), word(to)],
            data: U256::from(value).to_be_bytes::<32>().to_vec().into(),
            block_number: 7,
            log_index: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_event_orders_fields_by_declaration() {
        let d = descriptor();
        let from = address!("00000000000000000000000000000000000000aa");
        let to = address!("00000000000000000000000000000000000000bb");
        let event = d.decode_event("Transfer", &transfer_log(from, to, 5)).unwrap();

        assert_eq!(event.name, "Transfer");
        let names: Vec<&str> = event.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["from", "to", "value"]);
        assert_eq!(event.field("from"), Some(&DynSolValue::Address(from)));
        assert_eq!(event.field("value"), Some(&DynSolValue::Uint(U256::from(5), 256)));
        assert!(event.fields[0].indexed && !event.fields[2].indexed);
    }

    #[test]
    fn test_decode_event_is_idempotent() {
        let d = descriptor();
        let log = transfer_log(Address::ZERO, Address::ZERO, 9);
        assert_eq!(
            d.decode_event("Transfer", &log).unwrap(),
            d.decode_event("Transfer", &log).unwrap()
        );
    }

    #[test]
    fn test_decode_event_fails_closed() {
        let d = descriptor();

        let mut wrong_topic = transfer_log(Address::ZERO, Address::ZERO, 1);
        wrong_topic.topics[0] = B256::repeat_byte(0x11);
        assert!(matches!(
            d.decode_event("Transfer", &wrong_topic),
            Err(BindError::Decoding(_))
        ));
        assert!(d.decode_any_event(&wrong_topic).is_err());

        let mut short_data = transfer_log(Address::ZERO, Address::ZERO, 1);
        short_data.data = Bytes::from_static(&[1, 2, 3]);
        assert!(d.decode_event("Transfer", &short_data).is_err());

        let mut missing_topic = transfer_log(Address::ZERO, Address::ZERO, 1);
        missing_topic.topics.pop();
        assert!(d.decode_event("Transfer", &missing_topic).is_err());
    }

    #[test]
    fn test_decode_any_event_uses_topic() {
        let d = descriptor();
        let event = d
            .decode_any_event(&transfer_log(Address::ZERO, Address::ZERO, 1))
            .unwrap();
        assert_eq!(event.name, "Transfer");
    }

    #[test]
    fn test_overloaded_events_decode_by_topic() {
        let d = ContractDescriptor::from_json(
            r#"[
                {"type":"event","name":"Ping","anonymous":false,
                 "inputs":[{"name":"n","type":"uint256","indexed":false}]},
                {"type":"event","name":"Ping","anonymous":false,
                 "inputs":[{"name":"from","type":"address","indexed":true},
                           {"name":"n","type":"uint256","indexed":false}]}
            ]"#,
            "0x",
        )
        .unwrap();
        let from = address!("00000000000000000000000000000000000000cc");
        let second = d.event("Ping(address,uint256)").unwrap();
        assert_eq!(second.inputs.len(), 2);
        assert_eq!(d.event("Ping(uint256)").unwrap().inputs.len(), 1);
        assert!(d.event("Ping(bool)").is_err());

        let log = RawLog {
            topics: vec![second.selector(), word(from)],
            data: U256::from(3).to_be_bytes::<32>().to_vec().into(),
            ..Default::default()
        };

        let any = d.decode_any_event(&log).unwrap();
        assert_eq!(any.field("from"), Some(&DynSolValue::Address(from)));
        let named = d.decode_event("Ping", &log).unwrap();
        assert_eq!(named, any);
        assert_eq!(named.field("n"), Some(&DynSolValue::Uint(U256::from(3), 256)));
    }

    #[test]
    fn test_event_topics() {
        let d = descriptor();
        let from = address!("00000000000000000000000000000000000000aa");

        let topics = d
            .event_topics("Transfer", &[Some(vec![DynSolValue::Address(from)]), None])
            .unwrap();
        assert_eq!(topics.len(), 2, "trailing wildcards are trimmed");
        assert_eq!(topics[0], Some(vec![d.event("Transfer").unwrap().selector()]));
        assert_eq!(topics[1], Some(vec![word(from)]));

        let memo = d
            .event_topics("Memo", &[Some(vec![DynSolValue::String("tag".into())])])
            .unwrap();
        assert_eq!(memo[1], Some(vec![keccak256("tag")]));

        assert!(d
            .event_topics("Transfer", &[Some(vec![DynSolValue::Bool(true)])])
            .is_err());
        assert!(d.event_topics("Transfer", &[None, None, None]).is_err());
    }

    #[tokio::test]
    async fn test_load_hardhat_and_foundry_artifacts() {
        let dir = tempdir().unwrap();
        let abi: Value = serde_json::from_str(TOKEN_ABI).unwrap();

        let hardhat = dir.path().join("hardhat.json");
        std::fs::write(
            &hardhat,
            serde_json::json!({"abi": abi, "bytecode": "0x6080"}).to_string(),
        )
        .unwrap();
        let d = ContractDescriptor::load(&hardhat).await.unwrap();
        assert_eq!(d.bytecode().as_ref(), &[0x60, 0x80]);
        assert!(d.abi().function("transfer").is_some());

        let foundry = dir.path().join("foundry.json");
        std::fs::write(
            &foundry,
            serde_json::json!({"abi": abi, "bytecode": {"object": "0x6001"}}).to_string(),
        )
        .unwrap();
        let d = ContractDescriptor::load(&foundry).await.unwrap();
        assert_eq!(d.bytecode().as_ref(), &[0x60, 0x01]);

        assert!(ContractDescriptor::load(dir.path().join("missing.json"))
            .await
            .is_err());
    }
}
